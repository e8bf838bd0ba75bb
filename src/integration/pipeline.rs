//! TrackerPipeline for combining detection with tracking.

use tracing::trace;

use crate::error::{Error, Result};
use crate::render::Frame;
use crate::tracker::{MultiObjectTracker, Track};

use super::DetectionSource;

/// Detector and tracker run back to back on every frame.
///
/// Detections that are not people, or whose score does not exceed the
/// confidence threshold, never reach the tracker. Only confirmed tracks are
/// returned, in ascending track id order.
pub struct TrackerPipeline<D, T> {
    detector: D,
    tracker: T,
    confidence_threshold: f32,
}

impl<D, T> TrackerPipeline<D, T>
where
    D: DetectionSource,
    D::Error: std::error::Error + Send + Sync + 'static,
    T: MultiObjectTracker,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(detector: D, tracker: T, confidence_threshold: f32) -> Self {
        Self {
            detector,
            tracker,
            confidence_threshold,
        }
    }

    /// Detect, filter and track one frame.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<Vec<Track>> {
        let detections = self
            .detector
            .detect(frame)
            .map_err(|e| Error::Detection(Box::new(e)))?;
        let total = detections.len();

        let people: Vec<_> = detections
            .into_iter()
            .filter(|d| d.is_person() && d.score > self.confidence_threshold)
            .collect();
        trace!(frame = frame.index, total, kept = people.len(), "Filtered detections");

        let mut tracks: Vec<Track> = self
            .tracker
            .update(people, frame)
            .map_err(|e| Error::Tracking(Box::new(e)))?
            .into_iter()
            .filter(Track::is_confirmed)
            .collect();
        tracks.sort_by_key(|t| t.track_id);
        Ok(tracks)
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.confidence_threshold = threshold;
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }
}
