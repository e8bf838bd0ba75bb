//! Workplace discovery and occupancy tracking.
//!
//! Person detections are handed to a multi-object tracker; the resulting
//! trajectories are used to propose new workplace zones where someone stays
//! put, and to record occupancy intervals for every confirmed zone.
//!
//! The detector and tracker are external collaborators reached through the
//! [`DetectionSource`] and [`MultiObjectTracker`] traits. Zone records live
//! behind the [`ZoneStore`] port.

pub mod analysis;
pub mod config;
pub mod error;
pub mod geometry;
pub mod integration;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod source;
pub mod store;
pub mod tracker;
pub mod zone;

pub use analysis::{
    ClosedInterval, OccupancyStateMachine, PreviewOverlay, Proposal, ProposalThrottle, Sample,
    StabilityDetector, TrajectoryStore,
};
pub use config::{AnalysisConfig, SessionConfig};
pub use error::{Error, Result};
pub use geometry::Rect;
pub use integration::{DetectionBuilder, DetectionSource, TrackerPipeline};
pub use pipeline::{AnalysisPipeline, FrameAnalysis, FrameOutput};
pub use render::{Annotations, Frame};
pub use session::{Session, SessionControl, SessionEvent};
pub use source::{FrameFeed, FrameSource, ImageSequenceSource, VideoSource};
pub use store::{InMemoryZoneStore, StoreError, ZoneReport, ZoneStore};
pub use tracker::{Detection, MultiObjectTracker, Track, TrackState};
pub use zone::{OccupancyInterval, Zone, ZoneId, ZoneSnapshot};

/// Seconds since the Unix epoch, the time base used for every timestamp.
pub type Timestamp = f64;

/// Current wall-clock time as a [`Timestamp`].
pub fn unix_now() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
