//! # Error Types
//!
//! This module defines error types used throughout the promptslip library.

use thiserror::Error;

/// Main error type for promptslip operations
#[derive(Debug, Error)]
pub enum PromptslipError {
    /// Declared upload content type is not an accepted image format.
    /// Raised before any decoding is attempted.
    #[error("Unsupported file type")]
    UnsupportedFormat { content_type: String },

    /// Image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Image parameters that cannot be printed (zero width, width mismatch)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Failure while writing to a printer sink (image, text, cut, close)
    #[error("Printer error: {0}")]
    Sink(String),

    /// Transport-level errors (opening devices, binding sockets)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Topic generation failed
    #[error("Failed to generate conversation topics: {0}")]
    TopicSource(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PromptslipError {
    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::Decode(_) | Self::InvalidImage(_)
        )
    }
}

pub type Result<T, E = PromptslipError> = std::result::Result<T, E>;
