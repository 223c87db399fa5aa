//! # Rendering Module
//!
//! Everything that produces pixels for the print head.
//!
//! ## Modules
//!
//! - [`bitmap`]: Packed 1-bit image type accepted by printer sinks
//! - [`dither`]: Floyd–Steinberg error diffusion
//! - [`normalize`]: Upload decoding and the thermal preparation pipeline
//! - [`banner`]: Large-type text banners from a bitmap font
//!
//! ## Usage Example
//!
//! ```
//! use image::{DynamicImage, RgbImage, Rgb};
//! use promptslip::render::normalize::{normalize, NormalizeOptions};
//!
//! let photo = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 200, Rgb([200, 120, 40])));
//! let bitmap = normalize(photo, &NormalizeOptions::default())?;
//!
//! assert_eq!(bitmap.width(), 576);
//! assert_eq!(bitmap.height(), 1152);
//! # Ok::<(), promptslip::PromptslipError>(())
//! ```

pub mod banner;
pub mod bitmap;
pub mod dither;
pub mod normalize;

pub use bitmap::Bitmap;
