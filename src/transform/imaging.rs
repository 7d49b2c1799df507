//! Image decode/encode and the two geometric operations.
//!
//! Both operations only ever shrink: a target box larger than the source
//! leaves the pixels untouched and the stage reduces to a re-encode.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};

use super::error::{Result, TransformError};
use super::format::ImageFormat;

const FILTER: FilterType = FilterType::Lanczos3;

/// Decode `bytes` in whatever format they are, applying EXIF orientation.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(TransformError::Io)?;
    let mut decoder = reader.into_decoder().map_err(TransformError::Decode)?;
    let orientation = decoder.orientation().map_err(TransformError::Decode)?;

    let mut img = DynamicImage::from_decoder(decoder).map_err(TransformError::Decode)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Encode `img` as `format`. `quality` only affects jpeg and is clamped to
/// `1..=100`.
pub fn encode(img: &DynamicImage, format: ImageFormat, quality: u32) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encode_err = |source| TransformError::Encode { format, source };

    match format {
        ImageFormat::Jpeg => {
            let quality = quality.clamp(1, 100) as u8;
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            // jpeg has no alpha channel
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_err)?;
        }
        ImageFormat::Webp => return Err(TransformError::Unsupported(format)),
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::Tiff | ImageFormat::Bmp => {
            img.write_to(&mut buf, format.to_image_format())
                .map_err(encode_err)?;
        }
    }

    let bytes = buf.into_inner();
    if bytes.is_empty() {
        return Err(TransformError::EmptyResult);
    }
    Ok(bytes)
}

/// Aspect-preserving downscale so the image fits `width` x `height`.
///
/// A zero axis is unconstrained. Returns the input unchanged when it already
/// fits.
pub fn resize(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (sw, sh) = (img.width(), img.height());
    if sw == 0 || sh == 0 {
        return img;
    }

    let rw = f64::from(width) / f64::from(sw);
    let rh = f64::from(height) / f64::from(sh);
    let factor = match (width, height) {
        (0, 0) => return img,
        (_, 0) => rw,
        (0, _) => rh,
        _ => rw.min(rh),
    };

    if factor >= 1.0 {
        return img;
    }

    let (nw, nh) = scaled(sw, sh, factor);
    tracing::debug!("Resizing {}x{} to {}x{}", sw, sh, nw, nh);
    img.resize_exact(nw, nh, FILTER)
}

/// Downscale and center-crop so the image fills `width` x `height` exactly.
///
/// A zero axis is derived from the source aspect ratio. Returns the input
/// unchanged when it is already smaller than the box.
pub fn thumbnail(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (sw, sh) = (img.width(), img.height());
    if sw == 0 || sh == 0 || (width == 0 && height == 0) {
        return img;
    }

    let (tw, th) = match (width, height) {
        (w, 0) => (w, derive_axis(w, sh, sw)),
        (0, h) => (derive_axis(h, sw, sh), h),
        (w, h) => (w, h),
    };

    let factor = (f64::from(tw) / f64::from(sw)).max(f64::from(th) / f64::from(sh));
    if factor >= 1.0 {
        return img;
    }

    tracing::debug!("Thumbnailing {}x{} to {}x{}", sw, sh, tw, th);
    img.resize_to_fill(tw, th, FILTER)
}

fn scaled(sw: u32, sh: u32, factor: f64) -> (u32, u32) {
    let w = (f64::from(sw) * factor).round().max(1.0) as u32;
    let h = (f64::from(sh) * factor).round().max(1.0) as u32;
    (w, h)
}

/// Length of the missing axis for a `known` target, keeping `other / along`.
fn derive_axis(known: u32, other: u32, along: u32) -> u32 {
    ((f64::from(known) * f64::from(other) / f64::from(along)).round() as u32).max(1)
}
