//! Pixel-space geometry shared by tracks, zones and overlays.

mod rect;

pub use rect::Rect;
