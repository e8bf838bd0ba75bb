use crate::geometry::Rect;
use crate::tracker::TrackState;

/// A tracked person as reported by the external tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Identity assigned by the tracker, stable while the track lives
    pub track_id: u64,
    /// Current lifecycle state
    pub state: TrackState,
    /// Whether the tracker has confirmed this track
    pub is_activated: bool,
    /// Current bounding box
    pub rect: Rect,
}

impl Track {
    /// A confirmed, actively tracked track.
    pub fn confirmed(track_id: u64, rect: Rect) -> Self {
        Self {
            track_id,
            state: TrackState::Tracked,
            is_activated: true,
            rect,
        }
    }

    /// A track the tracker has not confirmed yet.
    pub fn tentative(track_id: u64, rect: Rect) -> Self {
        Self {
            track_id,
            state: TrackState::New,
            is_activated: false,
            rect,
        }
    }

    /// Only confirmed tracks participate in trajectory and occupancy analysis.
    pub fn is_confirmed(&self) -> bool {
        self.is_activated && self.state.is_visible()
    }

    /// Center of the bounding box, snapped down to whole pixels.
    pub fn center(&self) -> (f32, f32) {
        let (cx, cy) = self.rect.center();
        (cx.floor(), cy.floor())
    }
}
