//! # promptslip - Conversation Prompts on Receipt Paper
//!
//! promptslip prints an uploaded photo on an ESC/POS thermal printer with a
//! list of conversation prompts (or any text) underneath. It provides:
//!
//! - **Image preparation**: orientation, resize to the print width, tone
//!   adjustment and Floyd–Steinberg dithering to a 1-bit bitmap
//! - **Text sanitizing**: any Unicode text folded to printable ASCII
//! - **Print jobs**: image, text and cut sent to a printer that is always
//!   released afterwards
//! - **Printers**: ESC/POS over a device node, raw USB, or an in-memory dummy
//! - **Topics**: conversation prompts from the OpenAI chat-completions API
//! - **HTTP server**: upload form and text banners
//!
//! ## Quick Start
//!
//! ```no_run
//! use promptslip::{
//!     job::{self, JobOptions, PrintJob},
//!     printer::PrinterConfig,
//!     render::normalize::{self, NormalizeOptions},
//!     sink::{self, SinkConfig},
//! };
//! use std::path::PathBuf;
//!
//! let config = PrinterConfig::PAPER_80MM;
//! let bytes = std::fs::read("photo.jpg")?;
//! let bitmap = normalize::prepare_upload(
//!     &bytes,
//!     Some("image/jpeg"),
//!     &NormalizeOptions::for_printer(&config),
//! )?;
//!
//! let sink_config = SinkConfig::Device {
//!     path: PathBuf::from("/dev/usb/lp0"),
//!     baud: None,
//! };
//! let mut printer = sink::open_sink(&sink_config, config)?;
//! job::execute(
//!     &mut *printer,
//!     &PrintJob::new(Some(bitmap), "What made you laugh today?"),
//!     &JobOptions { width: config.width_dots, copies: 1 },
//! )?;
//!
//! # Ok::<(), promptslip::error::PromptslipError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`render`] | Image normalization, dithering, banners |
//! | [`sanitize`] | Unicode to printable ASCII |
//! | [`job`] | Print job orchestration |
//! | [`sink`] | Printer sinks and selection |
//! | [`protocol`] | ESC/POS command builders |
//! | [`transport`] | Device, USB and in-memory byte pipes |
//! | [`topics`] | Conversation topic generation |
//! | [`server`] | HTTP interface |
//! | [`printer`] | Paper profiles |
//! | [`error`] | Error types |

pub mod error;
pub mod job;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod sanitize;
pub mod server;
pub mod sink;
pub mod topics;
pub mod transport;

// Re-exports for convenience
pub use error::PromptslipError;
pub use printer::PrinterConfig;
pub use sink::{PrinterSink, SinkConfig};
