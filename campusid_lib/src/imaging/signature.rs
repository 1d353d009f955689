//! Freehand signature capture and normalization to the 370×120 ID frame.

use campusid_api::types::NamedImage;
use image::{DynamicImage, Rgba, RgbaImage};

use super::transform::{
    composite_on_white, encode_jpeg, fill_and_center_crop, CropRegion, SIGNATURE_SIZE,
    STANDARD_QUALITY,
};
use super::{require_id_number, ImagingError};

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Records pen strokes in canvas coordinates.
#[derive(Debug, Clone)]
pub struct SignaturePad {
    width: u32,
    height: u32,
    pen_width: f32,
    strokes: Vec<Vec<Point>>,
    drawing: bool,
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new(SIGNATURE_SIZE.width, SIGNATURE_SIZE.height)
    }
}

impl SignaturePad {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pen_width: 2.5,
            strokes: Vec::new(),
            drawing: false,
        }
    }

    pub fn with_pen_width(mut self, pen_width: f32) -> Self {
        self.pen_width = pen_width.max(0.5);
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn begin_stroke(&mut self, at: Point) {
        self.strokes.push(vec![at]);
        self.drawing = true;
    }

    /// Extends the current stroke. Ignored when the pen is up.
    pub fn add_point(&mut self, at: Point) {
        if !self.drawing {
            return;
        }
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.push(at);
        }
    }

    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// Ink on a transparent canvas of the pad size.
    pub fn render(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        let radius = self.pen_width / 2.0;
        for stroke in &self.strokes {
            match stroke.as_slice() {
                [] => {}
                [only] => stamp(&mut canvas, *only, radius),
                points => {
                    for pair in points.windows(2) {
                        draw_segment(&mut canvas, pair[0], pair[1], radius);
                    }
                }
            }
        }
        canvas
    }

    /// Exports the signature and hands it to `on_save`. The pad itself is
    /// left untouched so the user can keep editing.
    pub fn save<F>(&self, id_number: Option<&str>, on_save: F) -> Result<(), ImagingError>
    where
        F: FnOnce(NamedImage),
    {
        let id_number = require_id_number(id_number)?;
        if self.is_empty() {
            return Err(ImagingError::EmptySignature);
        }
        let image = normalize_signature(&DynamicImage::ImageRgba8(self.render()), id_number)?;
        on_save(image);
        Ok(())
    }
}

/// Flattens a captured signature on white and frames it at 370×120.
pub fn normalize_signature(
    image: &DynamicImage,
    id_number: &str,
) -> Result<NamedImage, ImagingError> {
    let id_number = require_id_number(Some(id_number))?;
    let flat = composite_on_white(&image.to_rgba8());
    let region = CropRegion::full(flat.width(), flat.height());
    let framed = fill_and_center_crop(&flat, region, SIGNATURE_SIZE);
    let bytes = encode_jpeg(&framed, STANDARD_QUALITY)?;
    Ok(NamedImage::jpeg(format!("{}_signature.jpg", id_number), bytes))
}

fn stamp(canvas: &mut RgbaImage, center: Point, radius: f32) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let r = radius.ceil() as i64;
    let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);
    for y in (cy - r)..=(cy + r) {
        for x in (cx - r)..=(cx + r) {
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let (dx, dy) = (x as f32 - center.x, y as f32 - center.y);
            if dx * dx + dy * dy <= radius * radius + 0.5 {
                canvas.put_pixel(x as u32, y as u32, INK);
            }
        }
    }
}

fn draw_segment(canvas: &mut RgbaImage, from: Point, to: Point, radius: f32) {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp(canvas, Point::new(from.x + dx * t, from.y + dy * t), radius);
    }
}
