//! Detector boundary: anything that turns a frame into person boxes.

use tracing::debug;

use crate::render::Frame;
use crate::tracker::Detection;

/// Per-frame object detector.
///
/// Implementations should report people with [`crate::tracker::PERSON_CLASS`].
/// Boxes of other classes are allowed and get dropped before tracking.
///
/// ```ignore
/// use workplace_tracker::{Detection, DetectionSource, Frame};
///
/// struct OnnxPeople { session: ort::Session }
///
/// impl DetectionSource for OnnxPeople {
///     type Error = ort::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, ort::Error> {
///         let rows: Vec<[f32; 6]> = run_yolo(&mut self.session, &frame.image)?;
///         Ok(rows.into_detections())
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error;

    /// Boxes found on `frame`, in frame pixel coordinates.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;
}

/// Conversion from raw model output rows.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// `(x1, y1, x2, y2, score, class_id)` rows as produced by YOLO-style heads.
///
/// Class ids are rounded to the nearest integer. Rows whose class is not a
/// finite, non-negative number are dropped.
impl IntoDetections for Vec<[f32; 6]> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .filter_map(|[x1, y1, x2, y2, score, class]| {
                let class_id = class_id(class)?;
                Some(Detection::new(x1, y1, x2, y2, score).with_class(class_id))
            })
            .collect()
    }
}

fn class_id(raw: f32) -> Option<u32> {
    let rounded = raw.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > u32::MAX as f32 {
        debug!(raw, "Dropping detection with invalid class id");
        return None;
    }
    Some(rounded as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_into_detections() {
        let rows = vec![[10.0, 20.0, 50.0, 80.0, 0.9, 0.0], [0.0, 0.0, 5.0, 5.0, 0.7, 2.0]];
        let detections = rows.into_detections();
        assert_eq!(detections.len(), 2);
        assert!(detections[0].is_person());
        assert_eq!(detections[0].bbox.width, 40.0);
        assert_eq!(detections[1].class_id, 2);
    }

    #[test]
    fn test_class_ids_are_rounded_and_validated() {
        let rows = vec![
            [0.0, 0.0, 5.0, 5.0, 0.9, 0.9999],
            [0.0, 0.0, 5.0, 5.0, 0.9, 2.0000002],
            [0.0, 0.0, 5.0, 5.0, 0.9, f32::NAN],
            [0.0, 0.0, 5.0, 5.0, 0.9, f32::INFINITY],
            [0.0, 0.0, 5.0, 5.0, 0.9, -1.0],
        ];
        let classes: Vec<u32> = rows.into_detections().iter().map(|d| d.class_id).collect();
        assert_eq!(classes, vec![1, 2]);
    }
}
