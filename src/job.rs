//! # Print Jobs
//!
//! A [`PrintJob`] is one request's worth of output: an optional image and the
//! text printed under it. [`execute`] sends it to a [`PrinterSink`] as
//!
//! ```text
//! text("\n") ──► image (if any) ──► text ──► cut
//! ```
//!
//! repeated `copies` times, and closes the sink exactly once afterwards
//! whether or not the body succeeded.

use tracing::{info, warn};

use crate::error::{PromptslipError, Result};
use crate::render::Bitmap;
use crate::sanitize::sanitize;
use crate::sink::PrinterSink;

/// Spacer printed before each copy.
const SPACER: &str = "\n";

/// Image and text for one print.
#[derive(Debug, Clone, Default)]
pub struct PrintJob {
    pub image: Option<Bitmap>,
    pub text: String,
}

impl PrintJob {
    pub fn new(image: Option<Bitmap>, text: impl Into<String>) -> Self {
        Self {
            image,
            text: text.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(None, text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOptions {
    /// Printer width in dots. Images must match it exactly.
    pub width: u32,
    /// How many times the job is printed.
    pub copies: u32,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            width: crate::printer::PrinterConfig::PAPER_80MM.width_dots,
            copies: 1,
        }
    }
}

/// Print `job` and close the sink.
///
/// ## Errors
///
/// The first error from the body is returned after `close` has run. A close
/// error is returned only when the body succeeded; otherwise it is logged.
pub fn execute(sink: &mut dyn PrinterSink, job: &PrintJob, options: &JobOptions) -> Result<()> {
    let body = print_copies(sink, job, options);
    let closed = sink.close();

    match (body, closed) {
        (Ok(()), Ok(())) => {
            info!(copies = options.copies, image = job.image.is_some(), "Print job complete");
            Ok(())
        }
        (Ok(()), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "Failed to close printer after error");
            Err(e)
        }
    }
}

fn print_copies(sink: &mut dyn PrinterSink, job: &PrintJob, options: &JobOptions) -> Result<()> {
    if let Some(image) = &job.image {
        if image.width() != options.width {
            return Err(PromptslipError::InvalidImage(format!(
                "image is {} dots wide, printer expects {}",
                image.width(),
                options.width
            )));
        }
    }

    let text = sanitize(&job.text);
    for _ in 0..options.copies {
        sink.text(SPACER)?;
        if let Some(image) = &job.image {
            sink.image(image)?;
        }
        sink.text(&text)?;
        sink.cut()?;
    }
    Ok(())
}
