use crate::geometry::Rect;

/// Class id of "person" in COCO-trained detectors.
pub const PERSON_CLASS: u32 = 0;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    /// Detector class id
    pub class_id: u32,
}

impl Detection {
    /// Person detection from TLBR corners (x1, y1, x2, y2).
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
            class_id: PERSON_CLASS,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self {
            bbox,
            score,
            class_id: PERSON_CLASS,
        }
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    #[inline]
    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS
    }
}
