use crate::Timestamp;
use crate::geometry::Rect;

/// Transient highlight of a just-proposed zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewOverlay {
    pub rect: Rect,
    pub expires_at: Timestamp,
}

impl PreviewOverlay {
    pub fn new(rect: Rect, now: Timestamp, duration: f64) -> Self {
        Self {
            rect,
            expires_at: now + duration,
        }
    }

    #[inline]
    pub fn is_live(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}
