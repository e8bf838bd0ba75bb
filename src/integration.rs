//! Glue between an object detector, the external tracker and the analysis core.
//!
//! Detection backends plug in through [`DetectionSource`]; [`TrackerPipeline`]
//! runs detector and tracker back to back and hands confirmed tracks on.

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::TrackerPipeline;
