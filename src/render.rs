//! Video frames, overlay geometry and annotated-frame encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use crate::error::Result;
use crate::geometry::Rect;

const TRACK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CONFIRMED_ZONE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const PROPOSED_ZONE_COLOR: Rgb<u8> = Rgb([160, 160, 160]);
const PREVIEW_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

const LINE_THICKNESS: u32 = 2;
const PREVIEW_THICKNESS: u32 = 3;

/// A decoded RGB video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the source stream, counting from zero and across rewinds
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Uniform black frame, handy for fakes and tests.
    pub fn blank(index: u64, width: u32, height: u32) -> Self {
        Self::new(index, RgbImage::new(width, height))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Zone drawn on the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneMark {
    pub rect: Rect,
    pub confirmed: bool,
}

/// Overlay geometry for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// Confirmed tracks as `(track_id, box)`, ascending id
    pub tracks: Vec<(u64, Rect)>,
    pub zones: Vec<ZoneMark>,
    /// Highlight of a just-proposed zone, while it is live
    pub preview: Option<Rect>,
}

impl Annotations {
    /// Draw every box onto `image`; boxes are clipped to the frame.
    pub fn draw(&self, image: &mut RgbImage) {
        for zone in &self.zones {
            let color = if zone.confirmed {
                CONFIRMED_ZONE_COLOR
            } else {
                PROPOSED_ZONE_COLOR
            };
            draw_rect_outline(image, &zone.rect, color, LINE_THICKNESS);
        }
        for (_, rect) in &self.tracks {
            draw_rect_outline(image, rect, TRACK_COLOR, LINE_THICKNESS);
        }
        if let Some(rect) = &self.preview {
            draw_rect_outline(image, rect, PREVIEW_COLOR, PREVIEW_THICKNESS);
        }
    }
}

/// Outline `rect` with a stroke of `thickness` pixels drawn inward.
pub fn draw_rect_outline(image: &mut RgbImage, rect: &Rect, color: Rgb<u8>, thickness: u32) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || !rect.is_valid() {
        return;
    }

    let [x1, y1, x2, y2] = rect.to_tlbr();
    let left = x1.floor() as i64;
    let top = y1.floor() as i64;
    let right = x2.ceil() as i64 - 1;
    let bottom = y2.ceil() as i64 - 1;
    let t = thickness.max(1) as i64;

    for y in top.max(0)..=bottom.min(height as i64 - 1) {
        for x in left.max(0)..=right.min(width as i64 - 1) {
            let on_edge = x < left + t || x > right - t || y < top + t || y > bottom - t;
            if on_edge {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Encode an RGB image as JPEG.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.encode_image(image)?;
    Ok(buffer)
}
