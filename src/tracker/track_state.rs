/// Lifecycle of a track as reported by the external tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Just spawned from an unmatched detection
    #[default]
    New,
    /// Matched on the latest frame
    Tracked,
    /// Missed recently; the tracker may still recover it
    Lost,
    /// Dropped for good; its id will not come back
    Removed,
}

impl TrackState {
    /// Whether the person was seen on the current frame.
    #[inline]
    pub fn is_visible(self) -> bool {
        self == TrackState::Tracked
    }
}
