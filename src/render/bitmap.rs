//! # 1-Bit Bitmaps
//!
//! [`Bitmap`] is the only image type a printer sink accepts. It stores one bit
//! per dot, packed the way ESC/POS raster commands expect:
//!
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x0F = 00001111 = ░░░░████
//! ```
//!
//! Rows are padded to a whole number of bytes with white dots.

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::io::Cursor;

use crate::error::{PromptslipError, Result};

/// A packed 1-bit image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Create an all-white bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        let width_bytes = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            data: vec![0u8; width_bytes * height as usize],
        }
    }

    /// Build a bitmap from a per-dot predicate (true = black).
    pub fn from_fn<F>(width: u32, height: u32, mut is_black: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut bitmap = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if is_black(x, y) {
                    bitmap.set(x, y, true);
                }
            }
        }
        bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per packed row.
    pub fn width_bytes(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    /// Packed dot data, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Packed bytes for rows `start..end`.
    pub fn rows(&self, start: u32, end: u32) -> &[u8] {
        let wb = self.width_bytes();
        &self.data[start as usize * wb..end as usize * wb]
    }

    /// Whether the dot at (x, y) is black. Out-of-range reads are white.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.width_bytes() + x as usize / 8;
        (self.data[idx] >> (7 - (x % 8))) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.width_bytes() + x as usize / 8;
        let mask = 1 << (7 - (x % 8));
        if black {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Number of black dots.
    pub fn black_count(&self) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.get(x, y))
            .count()
    }

    /// Expand to an 8-bit grayscale image (black = 0, white = 255).
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) { Luma([0]) } else { Luma([255]) }
        })
    }

    /// Encode as a PNG for browser previews.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(self.to_gray_image())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| PromptslipError::Image(format!("Failed to encode PNG: {}", e)))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_white() {
        let bitmap = Bitmap::new(10, 3);
        assert_eq!(bitmap.width_bytes(), 2);
        assert_eq!(bitmap.data().len(), 6);
        assert_eq!(bitmap.black_count(), 0);
    }

    #[test]
    fn test_set_and_get() {
        let mut bitmap = Bitmap::new(16, 2);
        bitmap.set(0, 0, true);
        bitmap.set(9, 1, true);
        assert!(bitmap.get(0, 0));
        assert!(bitmap.get(9, 1));
        assert!(!bitmap.get(1, 0));
        assert_eq!(bitmap.data(), &[0x80, 0x00, 0x00, 0x40]);

        bitmap.set(0, 0, false);
        assert!(!bitmap.get(0, 0));
        // Out of range is ignored
        bitmap.set(100, 100, true);
        assert!(!bitmap.get(100, 100));
    }

    #[test]
    fn test_from_fn_checkerboard() {
        let bitmap = Bitmap::from_fn(8, 2, |x, y| (x + y) % 2 == 0);
        assert_eq!(bitmap.data(), &[0xAA, 0x55]);
        assert_eq!(bitmap.black_count(), 8);
    }

    #[test]
    fn test_gray_image_and_png() {
        let bitmap = Bitmap::from_fn(4, 4, |x, _| x < 2);
        let gray = bitmap.to_gray_image();
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(3, 3).0[0], 255);

        let png = bitmap.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
