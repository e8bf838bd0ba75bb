//! Analysis and session configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::VideoSource;

/// Tunables for trajectory analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// How long a person must stay put before a zone is proposed (seconds).
    pub stability_window_seconds: f64,
    /// Detections at or below this score are dropped before tracking.
    pub confidence_threshold: f32,
    /// Minimum samples inside the stability window.
    pub min_track_points: usize,
    /// Largest allowed frame-to-frame center displacement while staying (pixels).
    pub max_displacement_px: f32,
    /// Side of the square proposed around a stable centroid (pixels).
    pub zone_size_px: f32,
    /// How long a fresh proposal stays highlighted on the video (seconds).
    pub preview_duration_seconds: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stability_window_seconds: 10.0,
            confidence_threshold: 0.5,
            min_track_points: 20,
            max_displacement_px: 30.0,
            zone_size_px: 100.0,
            preview_duration_seconds: 5.0,
        }
    }
}

impl AnalysisConfig {
    /// Trajectory samples older than this are pruned.
    pub fn retention_window(&self) -> f64 {
        self.stability_window_seconds * 2.0
    }

    /// Minimum time between two proposals attributed to the same track.
    pub fn proposal_cooldown(&self) -> f64 {
        self.stability_window_seconds * 5.0
    }

    pub fn validate(&self) -> Result<()> {
        validate_window(self.stability_window_seconds)?;
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.min_track_points == 0 {
            return Err(Error::InvalidConfig(
                "min_track_points must be at least 1".to_string(),
            ));
        }
        if !(self.max_displacement_px > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_displacement_px must be positive, got {}",
                self.max_displacement_px
            )));
        }
        if !(self.zone_size_px > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "zone_size_px must be positive, got {}",
                self.zone_size_px
            )));
        }
        if !(self.preview_duration_seconds >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "preview_duration_seconds must not be negative, got {}",
                self.preview_duration_seconds
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_window(seconds: f64) -> Result<()> {
    if seconds.is_finite() && seconds > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "stability_window_seconds must be positive, got {seconds}"
        )))
    }
}

/// Per-session settings: where frames come from plus analysis tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub video_source: VideoSource,
    /// Frames buffered between the capture worker and the analysis loop.
    #[serde(default = "default_frame_queue_capacity")]
    pub frame_queue_capacity: usize,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(flatten)]
    pub analysis: AnalysisConfig,
}

fn default_frame_queue_capacity() -> usize {
    2
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            video_source: VideoSource::default(),
            frame_queue_capacity: default_frame_queue_capacity(),
            jpeg_quality: default_jpeg_quality(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: SessionConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "frame_queue_capacity must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidConfig(format!(
                "jpeg_quality must be within [1, 100], got {}",
                self.jpeg_quality
            )));
        }
        self.analysis.validate()
    }
}
