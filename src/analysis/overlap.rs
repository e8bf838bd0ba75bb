use crate::geometry::Rect;

/// Whether two rectangles overlap (shared edges excluded).
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

/// Whether `candidate` collides with any of `existing`.
pub fn overlaps_any<I>(candidate: &Rect, existing: I) -> bool
where
    I: IntoIterator<Item = Rect>,
{
    existing.into_iter().any(|zone| candidate.overlaps(&zone))
}
