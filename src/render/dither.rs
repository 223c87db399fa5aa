//! # Floyd–Steinberg Error Diffusion
//!
//! Converts continuous-tone grayscale images to binary (black/white) output
//! suitable for thermal printers.
//!
//! ## What is Dithering?
//!
//! Dithering simulates grayscale on a device that can only print black or white.
//! By varying the density of black dots, we create the illusion of different
//! gray levels.
//!
//! ```text
//! Grayscale:    White    Light    Medium    Dark    Black
//!               ░░░░░░   ░░▒░░░   ░▒░▒░▒   ▒▓▒▓▒▓   ██████
//! ```
//!
//! ## Error Diffusion
//!
//! Each pixel is quantized to black or white against a fixed threshold and the
//! quantization error is pushed to neighbours that have not been visited yet:
//!
//! ```text
//!              ┌───────┬───────┐
//!              │   *   │ 7/16  │
//!      ┌───────┼───────┼───────┤
//!      │ 3/16  │ 5/16  │ 1/16  │
//!      └───────┴───────┴───────┘
//! ```
//!
//! Pixels are visited left to right, top to bottom. Unlike ordered dithering
//! the result depends on scan order, so the same input always produces the
//! same output but neighbouring regions influence each other.
//!
//! ## Usage Example
//!
//! ```
//! use image::{GrayImage, Luma};
//! use promptslip::render::dither;
//!
//! let gray = GrayImage::from_pixel(16, 4, Luma([0]));
//! let bitmap = dither::floyd_steinberg(&gray);
//! assert_eq!(bitmap.black_count(), 64);
//! ```

use image::GrayImage;
use tracing::debug;

use super::bitmap::Bitmap;

/// Luminance at or above this value becomes white.
pub const THRESHOLD: f32 = 128.0;

/// Dither a grayscale image into a 1-bit bitmap.
pub fn floyd_steinberg(img: &GrayImage) -> Bitmap {
    let (width, height) = img.dimensions();
    debug!(width, height, "Applying Floyd-Steinberg dithering");

    let w = width as usize;
    let h = height as usize;
    let mut buffer: Vec<f32> = img.pixels().map(|p| p.0[0] as f32).collect();
    let mut bitmap = Bitmap::new(width, height);

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let old = buffer[idx];
            let (new, black) = if old >= THRESHOLD {
                (255.0, false)
            } else {
                (0.0, true)
            };
            if black {
                bitmap.set(x as u32, y as u32, true);
            }
            let error = old - new;

            // Right: 7/16
            if x + 1 < w {
                buffer[idx + 1] += error * 7.0 / 16.0;
            }
            if y + 1 < h {
                let below = idx + w;
                // Bottom-left: 3/16
                if x > 0 {
                    buffer[below - 1] += error * 3.0 / 16.0;
                }
                // Bottom: 5/16
                buffer[below] += error * 5.0 / 16.0;
                // Bottom-right: 1/16
                if x + 1 < w {
                    buffer[below + 1] += error / 16.0;
                }
            }
        }
    }

    bitmap
}
