//! # Printer Configuration
//!
//! Hardware specifications for the receipt printers promptslip targets.
//!
//! ## Supported Paper Widths
//!
//! | Profile | Paper | Width (dots) | Resolution |
//! |---------|-------|--------------|------------|
//! | `80mm`  | 80mm  | 576          | 203 DPI    |
//! | `58mm`  | 58mm  | 384          | 203 DPI    |
//!
//! ## Usage
//!
//! ```
//! use promptslip::printer::PrinterConfig;
//!
//! let config = PrinterConfig::PAPER_80MM;
//! println!("Print width: {} dots ({} bytes)",
//!          config.width_dots,
//!          config.width_bytes());
//! ```

/// Widest raster a `GS v 0` header can describe: `u16::MAX` bytes per row.
pub const MAX_WIDTH_DOTS: u32 = u16::MAX as u32 * 8;

/// # Printer Configuration
///
/// Defines the print head characteristics of a thermal printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Profile name
    pub name: &'static str,

    /// Maximum print width in dots (pixels)
    pub width_dots: u32,

    /// Maximum rows per `GS v 0` raster block
    pub max_raster_rows: u32,
}

impl PrinterConfig {
    /// # 80mm Receipt Paper
    ///
    /// ```text
    /// ├── 4mm ──┼────── 72mm printable ──────┼── 4mm ──┤
    /// │ margin  │         576 dots           │ margin  │
    /// ```
    pub const PAPER_80MM: Self = Self {
        name: "80mm",
        width_dots: 576,
        max_raster_rows: 960,
    };

    /// # 58mm Receipt Paper
    ///
    /// 48mm printable, 384 dots.
    pub const PAPER_58MM: Self = Self {
        name: "58mm",
        width_dots: 384,
        max_raster_rows: 960,
    };

    /// Print width in bytes (8 dots per byte)
    #[inline]
    pub fn width_bytes(&self) -> u32 {
        self.width_dots.div_ceil(8)
    }

    /// A profile with a custom dot width (e.g. printers with unusual heads).
    pub fn with_width(self, width_dots: u32) -> Self {
        Self { width_dots, ..self }
    }

    /// Parse a profile name: `80mm`, `58mm`, or a raw dot width like `512`.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "80mm" | "80" => Ok(Self::PAPER_80MM),
            "58mm" | "58" => Ok(Self::PAPER_58MM),
            other => {
                let width: u32 = other.parse().map_err(|_| {
                    format!("Unknown paper profile '{}'. Use '80mm', '58mm' or a dot width", s)
                })?;
                if width == 0 {
                    return Err("Print width must be positive".to_string());
                }
                if width > MAX_WIDTH_DOTS {
                    return Err(format!(
                        "Print width {} exceeds the raster limit of {} dots",
                        width, MAX_WIDTH_DOTS
                    ));
                }
                Ok(Self::PAPER_80MM.with_width(width))
            }
        }
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::PAPER_80MM
    }
}
