//! Pure raster stages: compositing, face-centered framing, resizing, encoding.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use serde::Deserialize;

use super::ImagingError;

/// Output frame of an ID photo.
pub const PHOTO_SIZE: TargetSize = TargetSize {
    width: 320,
    height: 378,
};

/// Output frame of a signature.
pub const SIGNATURE_SIZE: TargetSize = TargetSize {
    width: 370,
    height: 120,
};

/// JPEG quality used after compositing and for normal-sized results.
pub const STANDARD_QUALITY: u8 = 95;

/// JPEG quality used when the intermediate result is larger than [`COMPRESSION_THRESHOLD`].
pub const COMPRESSED_QUALITY: u8 = 70;

pub const COMPRESSION_THRESHOLD: usize = 2 * 1024 * 1024;

/// Crop side relative to the larger face dimension.
const FACE_MARGIN: f32 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

/// Face bounding box in source pixel coordinates.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImagingError> {
    image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))
}

/// Draws the image over a white rectangle of the same size.
///
/// The result has no alpha channel; partially transparent pixels are blended
/// against white.
pub fn composite_on_white(image: &RgbaImage) -> RgbImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, image, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(buf)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Square region of side `2.2 × max(face w, face h)` centered on the face,
/// clamped to the image. Without a usable face the whole image is used.
pub fn face_crop_region(width: u32, height: u32, face: Option<FaceBox>) -> CropRegion {
    let Some(face) = face.filter(|f| f.width > 0.0 && f.height > 0.0) else {
        return CropRegion::full(width, height);
    };
    if width == 0 || height == 0 {
        return CropRegion::full(width, height);
    }

    let (w, h) = (width as f32, height as f32);
    let side = FACE_MARGIN * face.width.max(face.height);
    let cx = face.x + face.width / 2.0;
    let cy = face.y + face.height / 2.0;

    let left = (cx - side / 2.0).clamp(0.0, w);
    let top = (cy - side / 2.0).clamp(0.0, h);
    let right = (cx + side / 2.0).clamp(0.0, w);
    let bottom = (cy + side / 2.0).clamp(0.0, h);

    let x = (left.round() as u32).min(width.saturating_sub(1));
    let y = (top.round() as u32).min(height.saturating_sub(1));
    let crop_w = ((right - left).round() as u32).clamp(1, width - x);
    let crop_h = ((bottom - top).round() as u32).clamp(1, height - y);

    CropRegion {
        x,
        y,
        width: crop_w,
        height: crop_h,
    }
}

/// Centered sub-rectangle of `region` with the target's aspect ratio.
///
/// This is the part of `region` that survives a fill-scale followed by a
/// center crop, expressed in source pixels.
pub fn visible_window(region: CropRegion, target: TargetSize) -> CropRegion {
    if region.width == 0 || region.height == 0 || target.width == 0 || target.height == 0 {
        return region;
    }
    let (cw, ch) = (region.width as u64, region.height as u64);
    let (tw, th) = (target.width as u64, target.height as u64);

    // Compare cw / ch against tw / th without floating point.
    if cw * th > ch * tw {
        let width = ((ch * tw + th / 2) / th).clamp(1, cw) as u32;
        CropRegion {
            x: region.x + (region.width - width) / 2,
            y: region.y,
            width,
            height: region.height,
        }
    } else {
        let height = ((cw * th + tw / 2) / tw).clamp(1, ch) as u32;
        CropRegion {
            x: region.x,
            y: region.y + (region.height - height) / 2,
            width: region.width,
            height,
        }
    }
}

/// Scales `region` by `max(tw / cw, th / ch)` so it covers the target,
/// trims the overflow equally from both sides and places the result on a
/// white canvas of exactly the target size.
///
/// The overflow is trimmed in source space first, so no buffer larger than
/// the target or the region is ever allocated.
pub fn fill_and_center_crop(image: &RgbImage, region: CropRegion, target: TargetSize) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(target.width, target.height, Rgb([255, 255, 255]));
    if image.width() == 0 || image.height() == 0 || region.width == 0 || region.height == 0 {
        return canvas;
    }

    let window = visible_window(region, target);
    let source = imageops::crop_imm(image, window.x, window.y, window.width, window.height).to_image();
    let framed = imageops::resize(&source, target.width, target.height, FilterType::CatmullRom);
    imageops::replace(&mut canvas, &framed, 0, 0);
    canvas
}

/// Quality for the final encode, chosen from the size of the intermediate result.
pub fn compression_quality(intermediate_len: usize) -> u8 {
    quality_for_size(intermediate_len, COMPRESSION_THRESHOLD)
}

pub fn quality_for_size(intermediate_len: usize, threshold: usize) -> u8 {
    if intermediate_len > threshold {
        COMPRESSED_QUALITY
    } else {
        STANDARD_QUALITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgb([20, 40, 60])
            } else {
                Rgb([200, 180, 160])
            }
        })
    }

    #[test]
    fn composite_removes_all_transparency() {
        let mut rgba = RgbaImage::from_pixel(40, 30, Rgba([0, 0, 0, 0]));
        for x in 10..20 {
            rgba.put_pixel(x, 5, Rgba([255, 0, 0, 128]));
            rgba.put_pixel(x, 6, Rgba([0, 0, 255, 255]));
        }
        let flat = composite_on_white(&rgba);
        assert_eq!(flat.dimensions(), (40, 30));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(12, 6), &Rgb([0, 0, 255]));
        let blended = flat.get_pixel(12, 5);
        assert!(blended[0] >= 250);
        assert!(blended[1] > 100 && blended[1] < 160);

        let reloaded = DynamicImage::ImageRgb8(flat).to_rgba8();
        assert!(reloaded.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn no_face_uses_full_image() {
        assert_eq!(face_crop_region(640, 480, None), CropRegion::full(640, 480));
        let degenerate = FaceBox {
            x: 10.0,
            y: 10.0,
            width: 0.0,
            height: 5.0,
        };
        assert_eq!(
            face_crop_region(640, 480, Some(degenerate)),
            CropRegion::full(640, 480)
        );
    }

    #[test]
    fn face_region_is_centered_square() {
        let face = FaceBox {
            x: 400.0,
            y: 400.0,
            width: 100.0,
            height: 80.0,
        };
        let region = face_crop_region(1000, 1000, Some(face));
        assert_eq!(region.width, 220);
        assert_eq!(region.height, 220);
        assert_eq!(region.x, 340);
        assert_eq!(region.y, 330);
    }

    #[test]
    fn face_region_is_clamped_to_bounds() {
        let face = FaceBox {
            x: 5.0,
            y: 10.0,
            width: 100.0,
            height: 100.0,
        };
        let region = face_crop_region(300, 200, Some(face));
        assert_eq!(region.x, 0);
        assert_eq!(region.y, 0);
        assert!(region.x + region.width <= 300);
        assert!(region.y + region.height <= 200);
        assert_eq!(region.width, 165);
        assert_eq!(region.height, 170);
    }

    #[test]
    fn output_matches_target_for_any_aspect() {
        for (w, h) in [(1200, 800), (300, 1600), (320, 378), (17, 9), (1, 1)] {
            let img = checker(w, h);
            let out = fill_and_center_crop(&img, CropRegion::full(w, h), PHOTO_SIZE);
            assert_eq!(out.dimensions(), (320, 378), "source {}x{}", w, h);
            let sig = fill_and_center_crop(&img, CropRegion::full(w, h), SIGNATURE_SIZE);
            assert_eq!(sig.dimensions(), (370, 120), "source {}x{}", w, h);
        }
    }

    #[test]
    fn fill_leaves_no_letterbox() {
        // A solid dark wide image must cover the whole tall frame.
        let img = RgbImage::from_pixel(900, 300, Rgb([10, 10, 10]));
        let out = fill_and_center_crop(&img, CropRegion::full(900, 300), PHOTO_SIZE);
        assert!(out.pixels().all(|p| p[0] < 40));
    }

    #[test]
    fn visible_window_keeps_target_aspect_centered() {
        let wide = visible_window(CropRegion::full(900, 300), PHOTO_SIZE);
        assert_eq!(wide.height, 300);
        assert_eq!(wide.width, 254);
        assert_eq!(wide.x, (900 - 254) / 2);
        assert_eq!(wide.y, 0);

        let tall = visible_window(
            CropRegion {
                x: 10,
                y: 20,
                width: 100,
                height: 1000,
            },
            SIGNATURE_SIZE,
        );
        assert_eq!(tall.width, 100);
        assert_eq!(tall.height, 32);
        assert_eq!(tall.x, 10);
        assert_eq!(tall.y, 20 + (1000 - 32) / 2);

        let exact = visible_window(CropRegion::full(320, 378), PHOTO_SIZE);
        assert_eq!(exact, CropRegion::full(320, 378));
    }

    #[test]
    fn thin_strip_is_framed_without_blowing_up() {
        let strip = RgbImage::from_pixel(1, 1500, Rgb([30, 60, 90]));
        let window = visible_window(CropRegion::full(1, 1500), PHOTO_SIZE);
        assert_eq!((window.width, window.height), (1, 1));
        assert_eq!(window.y, 749);

        let out = fill_and_center_crop(&strip, CropRegion::full(1, 1500), PHOTO_SIZE);
        assert_eq!(out.dimensions(), (320, 378));
        assert!(out
            .pixels()
            .all(|p| p[0].abs_diff(30) <= 1 && p[1].abs_diff(60) <= 1 && p[2].abs_diff(90) <= 1));

        let wide = RgbImage::from_pixel(8000, 1, Rgb([30, 60, 90]));
        let out = fill_and_center_crop(&wide, CropRegion::full(8000, 1), SIGNATURE_SIZE);
        assert_eq!(out.dimensions(), (370, 120));
    }

    #[test]
    fn compression_threshold() {
        assert_eq!(compression_quality(COMPRESSION_THRESHOLD + 1), 70);
        assert_eq!(compression_quality(COMPRESSION_THRESHOLD), 95);
        assert_eq!(compression_quality(10_000), 95);
        assert_eq!(quality_for_size(501, 500), 70);
        assert_eq!(quality_for_size(500, 500), 95);
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let bytes = encode_jpeg(&checker(64, 48), STANDARD_QUALITY).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(matches!(decode(b"not an image"), Err(ImagingError::Decode(_))));
    }
}
