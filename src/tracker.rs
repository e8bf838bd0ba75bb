//! Boundary to the external multi-object tracker.
//!
//! The tracker itself is a black box. This module only defines what goes in
//! (per-frame [`Detection`]s) and what comes out ([`Track`]s with stable ids).

mod detection;
mod track;
mod track_state;

pub use detection::{Detection, PERSON_CLASS};
pub use track::Track;
pub use track_state::TrackState;

use crate::render::Frame;

/// Capability interface for a multi-object tracker.
///
/// Implementations keep their own association state between calls. Only
/// tracks for which [`Track::is_confirmed`] holds take part in trajectory
/// analysis.
///
/// # Example
///
/// ```ignore
/// use workplace_tracker::{Detection, Frame, MultiObjectTracker, Track};
///
/// struct MyTracker { /* DeepSORT, ByteTrack, ... */ }
///
/// impl MultiObjectTracker for MyTracker {
///     type Error = std::io::Error;
///
///     fn update(&mut self, detections: Vec<Detection>, frame: &Frame) -> Result<Vec<Track>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait MultiObjectTracker {
    /// Error type for tracker failures.
    type Error;

    /// Feed one frame's detections and return the tracker's current tracks.
    fn update(&mut self, detections: Vec<Detection>, frame: &Frame)
    -> Result<Vec<Track>, Self::Error>;
}
