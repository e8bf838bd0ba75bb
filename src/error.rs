//! Crate-wide error type.

use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the analysis pipeline and streaming sessions.
///
/// Source, initial zone load, detector, tracker and encoder failures end a
/// session.
/// Persistence and malformed-zone errors are logged and recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    /// The frame source could not be opened.
    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),

    /// Reading from an already opened frame source failed.
    #[error("frame read failed: {0}")]
    FrameRead(String),

    /// The detector failed on a frame.
    #[error("detection failed: {0}")]
    Detection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The tracker failed to update.
    #[error("tracking failed: {0}")]
    Tracking(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The zone list could not be loaded when the session started.
    #[error("zones unavailable: {0}")]
    ZonesUnavailable(#[source] StoreError),

    /// A zone store call failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// A zone record is missing fields or has an invalid rectangle.
    #[error("malformed zone {id}: {reason}")]
    MalformedZone { id: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The annotated frame could not be encoded.
    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether this error ends a streaming session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable(_)
                | Error::ZonesUnavailable(_)
                | Error::FrameRead(_)
                | Error::Detection(_)
                | Error::Tracking(_)
                | Error::Encode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::SourceUnavailable("cam".into()).is_fatal());
        assert!(Error::Detection("boom".into()).is_fatal());
        assert!(Error::ZonesUnavailable(StoreError::Unavailable("db".into())).is_fatal());
        assert!(!Error::Persistence(StoreError::Unavailable("db".into())).is_fatal());
        assert!(
            !Error::MalformedZone {
                id: "x".into(),
                reason: "missing bbox".into()
            }
            .is_fatal()
        );
    }
}
