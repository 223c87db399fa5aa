//! # Printer Module
//!
//! Printer-specific configuration.
//!
//! ## Modules
//!
//! - [`config`]: Print head specifications per paper width

pub mod config;

pub use config::{MAX_WIDTH_DOTS, PrinterConfig};
