//! Trajectory analysis: stability-driven zone proposals and zone occupancy.
//!
//! Each component owns its own keyed state (per track id or per zone id) and
//! is driven once per frame by [`crate::pipeline::AnalysisPipeline`].

mod occupancy;
mod overlap;
mod preview;
mod stability;
mod throttle;
mod trajectory;

pub use occupancy::{ClosedInterval, OccupancyEntry, OccupancyStateMachine};
pub use overlap::{overlaps, overlaps_any};
pub use preview::PreviewOverlay;
pub use stability::{Proposal, StabilityDetector, StableCandidate};
pub use throttle::ProposalThrottle;
pub use trajectory::{Sample, TrajectoryStore};
