//! # Text Banners
//!
//! Renders short text into a print-width [`Bitmap`] using the Spleen 12×24
//! bitmap font, scaled up by an integer factor so the longest line fills as
//! much of the paper as possible.
//!
//! ```text
//! ┌──────────────────────── width ────────────────────────┐
//! │                      24 dots padding                    │
//! │            ██   ██ ████ ██   ██    ████                │
//! │            ██   ██ ██   ██   ██   ██  ██               │  line × scale
//! │            ███████ ███  ██   ██   ██  ██               │
//! │            ██   ██ ████ ████ ████  ████                │
//! │                      24 dots padding                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Text goes through [`sanitize`](crate::sanitize::sanitize) first, so every
//! character that reaches the font is printable ASCII.

use spleen_font::{FONT_12X24, PSF2Font};

use super::bitmap::Bitmap;
use crate::error::{PromptslipError, Result};
use crate::sanitize::sanitize;

/// Glyph cell width in dots.
pub const GLYPH_WIDTH: u32 = 12;
/// Glyph cell height in dots.
pub const GLYPH_HEIGHT: u32 = 24;
/// Largest integer scale applied to glyphs.
pub const MAX_SCALE: u32 = 8;
/// Blank rows above and below the text.
pub const PADDING: u32 = 24;

/// A 12×24 glyph as row-major on/off dots.
type Glyph = [bool; (GLYPH_WIDTH * GLYPH_HEIGHT) as usize];

/// Render `text` as a banner exactly `width` dots wide.
pub fn render_banner(text: &str, width: u32) -> Result<Bitmap> {
    if width < GLYPH_WIDTH {
        return Err(PromptslipError::InvalidImage(format!(
            "banner width {} is narrower than one glyph",
            width
        )));
    }

    let clean = sanitize(text);
    let max_cols = (width / GLYPH_WIDTH) as usize;
    let lines = layout_lines(&clean, max_cols);

    let longest = lines.iter().map(|l| l.len()).max().unwrap_or(0).max(1) as u32;
    let scale = (width / (longest * GLYPH_WIDTH)).clamp(1, MAX_SCALE);
    let line_height = GLYPH_HEIGHT * scale;
    let height = PADDING * 2 + line_height * lines.len().max(1) as u32;

    let mut font = PSF2Font::new(FONT_12X24)
        .map_err(|_| PromptslipError::Image("failed to load banner font".to_string()))?;
    let mut bitmap = Bitmap::new(width, height);

    for (row, line) in lines.iter().enumerate() {
        let line_width = line.len() as u32 * GLYPH_WIDTH * scale;
        let x0 = width.saturating_sub(line_width) / 2;
        let y0 = PADDING + row as u32 * line_height;

        for (col, ch) in line.chars().enumerate() {
            let glyph = glyph_for(&mut font, ch);
            let gx = x0 + col as u32 * GLYPH_WIDTH * scale;
            blit(&mut bitmap, &glyph, gx, y0, scale);
        }
    }

    Ok(bitmap)
}

/// Split into lines, wrapping words so no line exceeds `max_cols`.
///
/// Words longer than a line are broken hard.
fn layout_lines(text: &str, max_cols: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let mut word = word;
            while word.len() > max_cols {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let (head, tail) = word.split_at(max_cols);
                lines.push(head.to_string());
                word = tail;
            }
            if word.is_empty() {
                continue;
            }
            let needed = if current.is_empty() {
                word.len()
            } else {
                current.len() + 1 + word.len()
            };
            if needed > max_cols {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    // Drop blank lines at either end, keep interior spacing
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    lines
}

fn glyph_for(font: &mut PSF2Font, ch: char) -> Glyph {
    let mut glyph = [false; (GLYPH_WIDTH * GLYPH_HEIGHT) as usize];
    let utf8 = ch.to_string();

    if let Some(rows) = font.glyph_for_utf8(utf8.as_bytes()) {
        for (y, row) in rows.enumerate() {
            for (x, on) in row.enumerate() {
                if (x as u32) < GLYPH_WIDTH && (y as u32) < GLYPH_HEIGHT {
                    glyph[y * GLYPH_WIDTH as usize + x] = on;
                }
            }
        }
    }
    glyph
}

/// Copy a glyph into the bitmap with nearest-neighbour scaling.
fn blit(bitmap: &mut Bitmap, glyph: &Glyph, x0: u32, y0: u32, scale: u32) {
    for gy in 0..GLYPH_HEIGHT {
        for gx in 0..GLYPH_WIDTH {
            if !glyph[(gy * GLYPH_WIDTH + gx) as usize] {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    bitmap.set(x0 + gx * scale + dx, y0 + gy * scale + dy, true);
                }
            }
        }
    }
}
