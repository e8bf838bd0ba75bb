use std::collections::BTreeMap;

use nalgebra::Point2;
use tracing::debug;

use crate::Timestamp;

/// One observed track center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Point2<f32>,
    pub timestamp: Timestamp,
}

impl Sample {
    pub fn new(x: f32, y: f32, timestamp: Timestamp) -> Self {
        Self {
            position: Point2::new(x, y),
            timestamp,
        }
    }
}

/// Time-windowed center history per track id.
///
/// Samples are kept in timestamp order; anything older than the retention
/// window (relative to the newest sample) is dropped on every `record`.
#[derive(Debug, Clone)]
pub struct TrajectoryStore {
    trajectories: BTreeMap<u64, Vec<Sample>>,
    retention: f64,
}

impl TrajectoryStore {
    pub fn new(retention: f64) -> Self {
        Self {
            trajectories: BTreeMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> f64 {
        self.retention
    }

    pub fn set_retention(&mut self, retention: f64) {
        self.retention = retention;
    }

    /// Append a sample and prune everything older than the retention window.
    ///
    /// Samples older than the newest recorded one are discarded so the
    /// history stays ordered.
    pub fn record(&mut self, track_id: u64, x: f32, y: f32, timestamp: Timestamp) {
        let history = self.trajectories.entry(track_id).or_default();

        if let Some(last) = history.last() {
            if timestamp < last.timestamp {
                debug!(
                    track_id,
                    timestamp,
                    last = last.timestamp,
                    "Dropping out-of-order trajectory sample"
                );
                return;
            }
        }

        history.push(Sample::new(x, y, timestamp));
        Self::prune(history, timestamp, self.retention);
    }

    /// Current samples for a track, oldest first (empty for unknown ids).
    pub fn history(&self, track_id: u64) -> &[Sample] {
        self.trajectories
            .get(&track_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Track ids with a recorded trajectory, ascending.
    pub fn track_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.trajectories.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &[Sample])> {
        self.trajectories
            .iter()
            .map(|(id, samples)| (*id, samples.as_slice()))
    }

    /// Prune every trajectory against `now` and forget the ones left empty.
    ///
    /// A tracker id that reappears after its history aged out starts over
    /// as a new trajectory.
    pub fn collect_garbage(&mut self, now: Timestamp) -> usize {
        let retention = self.retention;
        let before = self.trajectories.len();
        self.trajectories.retain(|_, history| {
            Self::prune(history, now, retention);
            !history.is_empty()
        });
        before - self.trajectories.len()
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    fn prune(history: &mut Vec<Sample>, now: Timestamp, retention: f64) {
        let stale = history.partition_point(|s| now - s.timestamp > retention);
        history.drain(..stale);
    }
}
