use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in frame pixel coordinates (TLWH format).
///
/// Zones serialize as a `[x, y, width, height]` array, the same shape the
/// zone records are stored in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the rectangle
    pub width: f32,
    /// Height of the rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Square of side `size` centered on `(cx, cy)`.
    ///
    /// The top-left corner is floored to whole pixels, so a centroid of
    /// `(400, 300)` with size 75 lands at `(362, 262)`.
    pub fn centered_square(cx: f32, cy: f32, size: f32) -> Self {
        Self {
            x: (cx - size / 2.0).floor(),
            y: (cy - size / 2.0).floor(),
            width: size,
            height: size,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Get the center point of the rectangle.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Both dimensions strictly positive and finite.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Half-open hit test: `x in [self.x, self.x + w)`, `y in [self.y, self.y + h)`.
    #[inline]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Two rectangles overlap unless one lies entirely left, right, above or
    /// below the other. Shared edges do not count as overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x >= other.x + other.width
            || other.x >= self.x + self.width
            || self.y >= other.y + other.height
            || other.y >= self.y + self.height)
    }
}

impl From<[f32; 4]> for Rect {
    fn from(v: [f32; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f32; 4] {
    fn from(r: Rect) -> Self {
        [r.x, r.y, r.width, r.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
        assert_eq!(rect.center(), (25.0, 40.0));
    }

    #[test]
    fn test_centered_square_floors_corner() {
        assert_eq!(
            Rect::centered_square(400.0, 300.0, 75.0),
            Rect::new(362.0, 262.0, 75.0, 75.0)
        );
        assert_eq!(
            Rect::centered_square(400.0, 300.0, 100.0),
            Rect::new(350.0, 250.0, 100.0, 100.0)
        );
    }

    #[test]
    fn test_contains_point_is_half_open() {
        let zone = Rect::new(100.0, 100.0, 75.0, 75.0);
        assert!(zone.contains_point(100.0, 100.0));
        assert!(zone.contains_point(174.9, 174.9));
        assert!(!zone.contains_point(175.0, 120.0));
        assert!(!zone.contains_point(120.0, 175.0));
        assert!(!zone.contains_point(99.9, 120.0));
    }

    #[test]
    fn test_overlap_partial() {
        // 50 + 75 = 125 > 100 and 100 + 75 = 175 > 50
        let a = Rect::new(50.0, 50.0, 75.0, 75.0);
        let b = Rect::new(100.0, 50.0, 75.0, 75.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 75.0, 75.0);
        let right = Rect::new(75.0, 0.0, 75.0, 75.0);
        let below = Rect::new(0.0, 75.0, 75.0, 75.0);
        assert!(!a.overlaps(&right));
        assert!(!right.overlaps(&a));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn test_containment_overlaps() {
        let outer = Rect::new(0.0, 0.0, 200.0, 200.0);
        let inner = Rect::new(50.0, 50.0, 10.0, 10.0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_disjoint_on_both_axes() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 10.0, 10.0),
            Rect::new(10.0, 0.0, 10.0, 10.0),
            Rect::new(-5.0, 3.0, 30.0, 2.0),
            Rect::new(100.0, 100.0, 1.0, 1.0),
        ];
        for a in &rects {
            for b in &rects {
                assert_eq!(a.overlaps(b), b.overlaps(a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_serde_as_array() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&rect).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
        let back: Rect = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        assert_eq!(back, rect);
    }

    #[test]
    fn test_is_valid() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 1.0, -1.0).is_valid());
        assert!(!Rect::new(f32::NAN, 0.0, 1.0, 1.0).is_valid());
    }
}
