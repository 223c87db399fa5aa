//! # ESC/POS Raster Graphics
//!
//! Prints [`Bitmap`]s with the `GS v 0` raster bit image command.
//!
//! ## Protocol Details
//!
//! | Format  | Bytes |
//! |---------|-------|
//! | ASCII   | GS v 0 m xL xH yL yH d1...dk |
//! | Hex     | 1D 76 30 m xL xH yL yH d1...dk |
//!
//! - `m`: density mode, 0 = normal
//! - `xL xH`: width in **bytes**, little-endian
//! - `yL yH`: height in dots, little-endian
//! - `d1...dk`: packed rows, k = width_bytes × height
//!
//! ## Long Images
//!
//! Many printers buffer a whole raster block before printing and reject
//! blocks taller than their buffer. [`raster_blocks`] splits tall bitmaps into
//! consecutive blocks of at most `max_rows` rows, which print seamlessly.

use super::commands::{GS, u16_le};
use crate::render::Bitmap;

/// # Raster Bit Image (GS v 0)
///
/// ```
/// use promptslip::protocol::graphics;
/// use promptslip::render::Bitmap;
///
/// let bitmap = Bitmap::from_fn(16, 2, |_, _| true);
/// let cmd = graphics::raster(&bitmap);
/// assert_eq!(&cmd[..8], &[0x1D, 0x76, 0x30, 0x00, 2, 0, 2, 0]);
/// assert_eq!(cmd.len(), 8 + 4);
/// ```
pub fn raster(bitmap: &Bitmap) -> Vec<u8> {
    raster_rows(bitmap, 0, bitmap.height())
}

/// Raster command for rows `start..end` of a bitmap.
fn raster_rows(bitmap: &Bitmap, start: u32, end: u32) -> Vec<u8> {
    let width_bytes = bitmap.width_bytes() as u16;
    let height = (end - start) as u16;
    let data = bitmap.rows(start, end);

    let mut cmd = Vec::with_capacity(8 + data.len());
    cmd.extend([GS, b'v', b'0', 0]);
    cmd.extend(u16_le(width_bytes));
    cmd.extend(u16_le(height));
    cmd.extend_from_slice(data);
    cmd
}

/// Split a bitmap into raster commands of at most `max_rows` rows each.
///
/// `max_rows` is clamped to what the 16-bit height field can carry.
pub fn raster_blocks(bitmap: &Bitmap, max_rows: u32) -> Vec<Vec<u8>> {
    let max_rows = max_rows.clamp(1, u16::MAX as u32);
    let mut blocks = Vec::new();
    let mut start = 0;

    while start < bitmap.height() {
        let end = (start + max_rows).min(bitmap.height());
        blocks.push(raster_rows(bitmap, start, end));
        start = end;
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_header() {
        let bitmap = Bitmap::new(576, 10);
        let cmd = raster(&bitmap);
        assert_eq!(&cmd[..4], &[0x1D, 0x76, 0x30, 0x00]);
        assert_eq!(u16::from_le_bytes([cmd[4], cmd[5]]), 72);
        assert_eq!(u16::from_le_bytes([cmd[6], cmd[7]]), 10);
        assert_eq!(cmd.len(), 8 + 72 * 10);
    }

    #[test]
    fn test_raster_pads_width() {
        // 10 dots need 2 bytes per row
        let bitmap = Bitmap::from_fn(10, 1, |_, _| true);
        let cmd = raster(&bitmap);
        assert_eq!(cmd[4], 2);
        assert_eq!(&cmd[8..], &[0xFF, 0xC0]);
    }

    #[test]
    fn test_blocks_cover_all_rows() {
        let bitmap = Bitmap::new(8, 25);
        let blocks = raster_blocks(&bitmap, 10);
        assert_eq!(blocks.len(), 3);

        let heights: Vec<u16> = blocks
            .iter()
            .map(|b| u16::from_le_bytes([b[6], b[7]]))
            .collect();
        assert_eq!(heights, vec![10, 10, 5]);
    }

    #[test]
    fn test_blocks_preserve_row_order() {
        // Row y is black iff y == 3
        let bitmap = Bitmap::from_fn(8, 4, |_, y| y == 3);
        let blocks = raster_blocks(&bitmap, 2);
        assert_eq!(&blocks[0][8..], &[0x00, 0x00]);
        assert_eq!(&blocks[1][8..], &[0x00, 0xFF]);
    }

    #[test]
    fn test_short_bitmap_single_block() {
        let bitmap = Bitmap::new(576, 100);
        let blocks = raster_blocks(&bitmap, 960);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0], raster(&bitmap));
    }

    #[test]
    fn test_block_height_fits_header() {
        let bitmap = Bitmap::new(8, u16::MAX as u32 + 10);
        let blocks = raster_blocks(&bitmap, u32::MAX);
        assert_eq!(blocks.len(), 2);
        assert_eq!(u16::from_le_bytes([blocks[0][6], blocks[0][7]]), u16::MAX);
        assert_eq!(u16::from_le_bytes([blocks[1][6], blocks[1][7]]), 10);
    }

    #[test]
    fn test_empty_bitmap_no_blocks() {
        assert!(raster_blocks(&Bitmap::new(8, 0), 960).is_empty());
    }
}
