//! # Thermal Image Preparation
//!
//! Turns uploaded image bytes into a [`Bitmap`] the printer can take directly.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──► content-type check ──► decode (+ EXIF orientation)
//!       ──► orient ──► resize to print width (Lanczos3)
//!       ──► grayscale ──► contrast ×1.5 ──► brightness ×1.1
//!       ──► Floyd–Steinberg ──► Bitmap
//! ```
//!
//! Every stage returns a new image. The output width always equals
//! [`NormalizeOptions::width`] and the height keeps the source aspect ratio.
//! Images that would scale past [`MAX_HEIGHT`] rows are rejected before any
//! buffer is allocated.

use image::{
    DynamicImage, GrayImage, ImageDecoder, ImageReader, Luma, imageops::FilterType,
    metadata::Orientation,
};
use std::io::Cursor;
use tracing::debug;

use super::{bitmap::Bitmap, dither};
use crate::error::{PromptslipError, Result};
use crate::printer::PrinterConfig;

/// Content types accepted for uploads.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Default contrast multiplier.
pub const DEFAULT_CONTRAST: f32 = 1.5;

/// Default brightness multiplier.
pub const DEFAULT_BRIGHTNESS: f32 = 1.1;

/// Tallest printable result in dots, about 2 m of paper at 203 DPI.
pub const MAX_HEIGHT: u32 = 16_384;

/// How the normalizer corrects image orientation before resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationPolicy {
    /// Use pixels as stored.
    None,
    /// Apply the EXIF orientation tag (phone photos).
    #[default]
    Exif,
    /// Apply EXIF, then turn landscape images a quarter turn so the long edge
    /// runs along the paper.
    Portrait,
}

impl OrientationPolicy {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "exif" => Ok(Self::Exif),
            "portrait" => Ok(Self::Portrait),
            _ => Err(format!(
                "Unknown orientation policy '{}'. Use 'none', 'exif' or 'portrait'",
                s
            )),
        }
    }
}

/// Normalizer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    /// Target width in dots.
    pub width: u32,
    pub orientation: OrientationPolicy,
    /// Contrast multiplier around the image's mean luminance.
    pub contrast: f32,
    /// Brightness multiplier.
    pub brightness: f32,
}

impl NormalizeOptions {
    pub fn for_printer(config: &PrinterConfig) -> Self {
        Self {
            width: config.width_dots,
            ..Self::default()
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            width: PrinterConfig::PAPER_80MM.width_dots,
            orientation: OrientationPolicy::default(),
            contrast: DEFAULT_CONTRAST,
            brightness: DEFAULT_BRIGHTNESS,
        }
    }
}

/// A decoded image together with the orientation its container declared.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    pub orientation: Orientation,
}

impl From<DynamicImage> for SourceImage {
    fn from(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: Orientation::NoTransforms,
        }
    }
}

/// Reject content types other than JPEG and PNG.
///
/// Media type parameters (`; charset=...`) and case are ignored.
pub fn check_content_type(content_type: Option<&str>) -> Result<()> {
    let declared = content_type.unwrap_or("");
    let essence = declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(PromptslipError::UnsupportedFormat {
            content_type: declared.to_string(),
        })
    }
}

/// Decode upload bytes after checking the declared content type.
pub fn decode(bytes: &[u8], content_type: Option<&str>) -> Result<SourceImage> {
    check_content_type(content_type)?;

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PromptslipError::Decode(e.to_string()))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| PromptslipError::Decode(e.to_string()))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let image =
        DynamicImage::from_decoder(decoder).map_err(|e| PromptslipError::Decode(e.to_string()))?;

    debug!(
        width = image.width(),
        height = image.height(),
        ?orientation,
        "Decoded upload"
    );
    Ok(SourceImage { image, orientation })
}

/// Convert an image into a printable 1-bit bitmap of exactly `options.width`.
pub fn normalize(source: impl Into<SourceImage>, options: &NormalizeOptions) -> Result<Bitmap> {
    if options.width == 0 {
        return Err(PromptslipError::InvalidImage(
            "target width must be positive".to_string(),
        ));
    }

    let source = source.into();
    if source.image.width() == 0 || source.image.height() == 0 {
        return Err(PromptslipError::InvalidImage("image has no pixels".to_string()));
    }

    let oriented = orient(source, options.orientation);
    let height = scaled_height(oriented.width(), oriented.height(), options.width);
    if height > MAX_HEIGHT {
        return Err(PromptslipError::InvalidImage(format!(
            "{}x{} image would print {} rows tall at width {} (limit {})",
            oriented.width(),
            oriented.height(),
            height,
            options.width,
            MAX_HEIGHT
        )));
    }
    let resized = resize_to_width(&oriented, options.width, height);
    let gray = resized.to_luma8();
    let toned = adjust_brightness(&adjust_contrast(&gray, options.contrast), options.brightness);
    let bitmap = dither::floyd_steinberg(&toned);

    debug!(
        width = bitmap.width(),
        height = bitmap.height(),
        "Normalized image for print"
    );
    Ok(bitmap)
}

/// Decode and normalize in one step.
pub fn prepare_upload(
    bytes: &[u8],
    content_type: Option<&str>,
    options: &NormalizeOptions,
) -> Result<Bitmap> {
    let source = decode(bytes, content_type)?;
    normalize(source, options)
}

fn orient(source: SourceImage, policy: OrientationPolicy) -> DynamicImage {
    let SourceImage {
        mut image,
        orientation,
    } = source;

    match policy {
        OrientationPolicy::None => image,
        OrientationPolicy::Exif => {
            image.apply_orientation(orientation);
            image
        }
        OrientationPolicy::Portrait => {
            image.apply_orientation(orientation);
            if image.width() > image.height() {
                image.rotate90()
            } else {
                image
            }
        }
    }
}

/// Target height for a uniform resize to `width`. Saturates at `u32::MAX`.
pub fn scaled_height(src_width: u32, src_height: u32, width: u32) -> u32 {
    let height = (src_height as f64 * width as f64 / src_width as f64).round() as u32;
    height.max(1)
}

fn resize_to_width(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Scale distance from the mean luminance by `factor`.
fn adjust_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let count = (img.width() as f64 * img.height() as f64).max(1.0);
    let sum: f64 = img.pixels().map(|p| p.0[0] as f64).sum();
    let mean = (sum / count).round() as f32;

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let val = img.get_pixel(x, y).0[0] as f32;
        Luma([(mean + (val - mean) * factor).round().clamp(0.0, 255.0) as u8])
    })
}

/// Multiply luminance by `factor`.
fn adjust_brightness(img: &GrayImage, factor: f32) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let val = img.get_pixel(x, y).0[0] as f32;
        Luma([(val * factor).round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn options(width: u32) -> NormalizeOptions {
        NormalizeOptions {
            width,
            ..NormalizeOptions::default()
        }
    }

    #[test]
    fn test_portrait_keeps_aspect_ratio() {
        let bitmap = normalize(solid(100, 200, [255, 255, 255]), &options(576)).unwrap();
        assert_eq!(bitmap.width(), 576);
        assert_eq!(bitmap.height(), 1152);
    }

    #[test]
    fn test_landscape_keeps_aspect_ratio() {
        let bitmap = normalize(solid(200, 100, [255, 255, 255]), &options(576)).unwrap();
        assert_eq!(bitmap.width(), 576);
        assert_eq!(bitmap.height(), 288);
    }

    #[test]
    fn test_custom_width() {
        let bitmap = normalize(solid(100, 100, [255, 255, 255]), &options(384)).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (384, 384));
    }

    #[test]
    fn test_height_rounds() {
        // 333 * 576 / 1000 = 191.808
        assert_eq!(scaled_height(1000, 333, 576), 192);
        // Very flat images keep at least one row
        assert_eq!(scaled_height(10_000, 1, 576), 1);
    }

    #[test]
    fn test_odd_widths_are_exact() {
        for width in [1, 7, 9, 383, 577] {
            let bitmap = normalize(solid(37, 53, [120, 40, 200]), &options(width)).unwrap();
            assert_eq!(bitmap.width(), width);
            assert_eq!(bitmap.height(), scaled_height(37, 53, width));
        }
    }

    #[test]
    fn test_white_prints_nothing_black_prints_everything() {
        let white = normalize(solid(50, 50, [255, 255, 255]), &options(64)).unwrap();
        assert_eq!(white.black_count(), 0);

        let black = normalize(solid(50, 50, [0, 0, 0]), &options(64)).unwrap();
        assert_eq!(black.black_count(), 64 * 64);
    }

    #[test]
    fn test_color_image_is_dithered() {
        let bitmap = normalize(solid(100, 100, [255, 128, 64]), &options(576)).unwrap();
        assert_eq!(bitmap.width(), 576);
        assert_eq!(bitmap.data().len(), 72 * 576);
    }

    #[test]
    fn test_tall_thin_image_rejected() {
        // 1x100 scales to 576x57600
        let err = normalize(solid(1, 100, [0, 0, 0]), &options(576)).unwrap_err();
        assert!(matches!(err, PromptslipError::InvalidImage(_)));
        assert!(err.is_client_error());

        assert_eq!(scaled_height(1, 65_535, 576), 37_748_160);
        let png = encode(&solid(1, 65_535, [255, 255, 255]), ImageFormat::Png);
        let err = prepare_upload(&png, Some("image/png"), &options(576)).unwrap_err();
        assert!(matches!(err, PromptslipError::InvalidImage(_)));
    }

    #[test]
    fn test_height_limit_is_inclusive() {
        let bitmap = normalize(solid(1, 256, [255, 255, 255]), &options(64)).unwrap();
        assert_eq!(bitmap.height(), MAX_HEIGHT);
    }

    #[test]
    fn test_zero_width_rejected() {
        let err = normalize(solid(10, 10, [0, 0, 0]), &options(0)).unwrap_err();
        assert!(matches!(err, PromptslipError::InvalidImage(_)));
    }

    #[test]
    fn test_portrait_policy_rotates_landscape() {
        let opts = NormalizeOptions {
            width: 100,
            orientation: OrientationPolicy::Portrait,
            ..NormalizeOptions::default()
        };
        let bitmap = normalize(solid(200, 100, [255, 255, 255]), &opts).unwrap();
        // 100x200 after the quarter turn
        assert_eq!((bitmap.width(), bitmap.height()), (100, 200));
    }

    #[test]
    fn test_exif_orientation_applied() {
        let source = SourceImage {
            image: solid(200, 100, [255, 255, 255]),
            orientation: Orientation::Rotate90,
        };
        let bitmap = normalize(source.clone(), &options(100)).unwrap();
        assert_eq!(bitmap.height(), 200);

        let opts = NormalizeOptions {
            width: 100,
            orientation: OrientationPolicy::None,
            ..NormalizeOptions::default()
        };
        let bitmap = normalize(source, &opts).unwrap();
        assert_eq!(bitmap.height(), 50);
    }

    /// JPEG with an APP1 Exif segment carrying only an Orientation tag.
    fn jpeg_with_orientation(img: &DynamicImage, orientation: u16) -> Vec<u8> {
        let jpeg = encode(img, ImageFormat::Jpeg);

        let mut tiff = Vec::new();
        tiff.extend(b"MM\x00\x2A");
        tiff.extend(8u32.to_be_bytes()); // first IFD offset
        tiff.extend(1u16.to_be_bytes()); // one entry
        tiff.extend(0x0112u16.to_be_bytes()); // Orientation
        tiff.extend(3u16.to_be_bytes()); // SHORT
        tiff.extend(1u32.to_be_bytes());
        tiff.extend(orientation.to_be_bytes());
        tiff.extend([0, 0]);
        tiff.extend(0u32.to_be_bytes()); // no next IFD

        let mut app1 = vec![0xFF, 0xE1];
        app1.extend(((2 + 6 + tiff.len()) as u16).to_be_bytes());
        app1.extend(b"Exif\x00\x00");
        app1.extend(tiff);

        // Right after SOI
        let mut out = jpeg[..2].to_vec();
        out.extend(app1);
        out.extend(&jpeg[2..]);
        out
    }

    #[test]
    fn test_decode_reads_exif_orientation_from_jpeg() {
        // Orientation 6: stored landscape, displayed rotated 90° clockwise
        let jpeg = jpeg_with_orientation(&solid(64, 32, [255, 255, 255]), 6);

        let source = decode(&jpeg, Some("image/jpeg")).unwrap();
        assert_eq!(source.orientation, Orientation::Rotate90);
        assert_eq!((source.image.width(), source.image.height()), (64, 32));

        let bitmap = prepare_upload(&jpeg, Some("image/jpeg"), &options(32)).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (32, 64));

        let stored = NormalizeOptions {
            width: 32,
            orientation: OrientationPolicy::None,
            ..NormalizeOptions::default()
        };
        let bitmap = prepare_upload(&jpeg, Some("image/jpeg"), &stored).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (32, 16));
    }

    #[test]
    fn test_jpeg_without_exif_has_no_transform() {
        let jpeg = encode(&solid(20, 10, [0, 0, 0]), ImageFormat::Jpeg);
        let source = decode(&jpeg, Some("image/jpeg")).unwrap();
        assert_eq!(source.orientation, Orientation::NoTransforms);
    }

    #[test]
    fn test_contrast_moves_away_from_mean() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([100]));
        img.put_pixel(1, 0, Luma([200]));
        // mean 150: 150 + (100-150)*1.5 = 75, 150 + 50*1.5 = 225
        let out = adjust_contrast(&img, 1.5);
        assert_eq!(out.get_pixel(0, 0).0[0], 75);
        assert_eq!(out.get_pixel(1, 0).0[0], 225);
    }

    #[test]
    fn test_brightness_scales_and_clamps() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([100]));
        img.put_pixel(1, 0, Luma([250]));
        let out = adjust_brightness(&img, 1.1);
        assert_eq!(out.get_pixel(0, 0).0[0], 110);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_content_type_check() {
        assert!(check_content_type(Some("image/jpeg")).is_ok());
        assert!(check_content_type(Some("image/png")).is_ok());
        assert!(check_content_type(Some("IMAGE/PNG; charset=binary")).is_ok());
        assert!(check_content_type(Some("text/plain")).is_err());
        assert!(check_content_type(Some("image/gif")).is_err());
        assert!(check_content_type(None).is_err());
    }

    #[test]
    fn test_unsupported_type_rejected_before_decoding() {
        // Valid PNG bytes with the wrong declared type
        let png = encode(&solid(10, 10, [0, 0, 0]), ImageFormat::Png);
        let err = decode(&png, Some("text/plain")).unwrap_err();
        assert!(matches!(err, PromptslipError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_corrupt_bytes_fail_decode() {
        let err = decode(b"This is not an image file", Some("image/jpeg")).unwrap_err();
        assert!(matches!(err, PromptslipError::Decode(_)));
    }

    #[test]
    fn test_prepare_upload_jpeg() {
        let jpeg = encode(&solid(100, 100, [255, 255, 255]), ImageFormat::Jpeg);
        let bitmap = prepare_upload(&jpeg, Some("image/jpeg"), &options(576)).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (576, 576));
    }
}
