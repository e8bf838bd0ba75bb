use nalgebra::distance;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Timestamp;
use crate::analysis::Sample;
use crate::config::AnalysisConfig;
use crate::geometry::Rect;

/// Candidate workplace found around a stable trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableCandidate {
    pub rect: Rect,
    pub centroid: (f32, f32),
    /// Timestamp of the first sample inside the stability window.
    pub start_time: Timestamp,
}

/// Proposal for a new, unconfirmed workplace zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub name: String,
    #[serde(rename = "bbox")]
    pub rect: Rect,
    pub track_id: u64,
    pub start_time: Timestamp,
}

impl Proposal {
    pub fn new(track_id: u64, candidate: &StableCandidate) -> Self {
        Self {
            name: proposal_name(),
            rect: candidate.rect,
            track_id,
            start_time: candidate.start_time,
        }
    }
}

fn proposal_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("Workplace {}", &id[..4])
}

/// Decides whether a trajectory shows someone staying in one place.
///
/// A trajectory is stable when, inside the last `window` seconds, it has at
/// least `min_points` samples, is continuously observed back to the start
/// of the window, and never jumps `max_displacement` pixels or more between
/// consecutive samples.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    window: f64,
    min_points: usize,
    max_displacement: f32,
    zone_size: f32,
}

impl StabilityDetector {
    pub fn new(window: f64, min_points: usize, max_displacement: f32, zone_size: f32) -> Self {
        Self {
            window,
            min_points,
            max_displacement,
            zone_size,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.stability_window_seconds,
            config.min_track_points,
            config.max_displacement_px,
            config.zone_size_px,
        )
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn set_window(&mut self, window: f64) {
        self.window = window;
    }

    /// Widest gap between samples that still lets `min_points` fit in the window.
    fn max_sample_gap(&self) -> f64 {
        self.window / self.min_points.max(1) as f64
    }

    /// Evaluate a trajectory (oldest sample first) at time `now`.
    pub fn evaluate(&self, history: &[Sample], now: Timestamp) -> Option<StableCandidate> {
        let first_recent = history.partition_point(|s| now - s.timestamp > self.window);
        let recent = &history[first_recent..];

        if recent.len() < self.min_points {
            return None;
        }

        // Anchor: last sample before the window, or the first one on its boundary.
        let anchor_index = first_recent.saturating_sub(1);
        let anchor = history.get(anchor_index)?;
        let first = recent.first()?;
        if now - anchor.timestamp < self.window {
            return None;
        }
        if first.timestamp - anchor.timestamp > self.max_sample_gap() {
            return None;
        }

        let moved_too_much = history[anchor_index..]
            .windows(2)
            .any(|pair| distance(&pair[0].position, &pair[1].position) >= self.max_displacement);
        if moved_too_much {
            return None;
        }

        let (cx, cy) = centroid(recent)?;
        Some(StableCandidate {
            rect: Rect::centered_square(cx, cy, self.zone_size),
            centroid: (cx, cy),
            start_time: first.timestamp,
        })
    }
}

fn centroid(samples: &[Sample]) -> Option<(f32, f32)> {
    let points = Array2::from_shape_fn((samples.len(), 2), |(i, axis)| {
        samples[i].position[axis]
    });
    let mean = points.mean_axis(Axis(0))?;
    Some((mean[0], mean[1]))
}
