//! # Printer Sinks
//!
//! A [`PrinterSink`] is the write-only surface the print orchestrator talks
//! to: `image`, `text`, `cut` and `close`. The one production implementation,
//! [`EscPosSink`], encodes those calls as ESC/POS and writes them to a
//! [`Transport`]; swapping the transport gives the real and dummy printers.
//!
//! ## Selecting a Sink
//!
//! [`SinkConfig`] names the printer explicitly and [`open_sink`] builds it:
//!
//! | Config | Transport |
//! |--------|-----------|
//! | `Dummy` | in-memory `Vec<u8>`, captured bytes optionally saved to a file |
//! | `Device` | [`DeviceTransport`] on a device node |
//! | `Usb` | `UsbTransport`, auto-detected when no id is given |

use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{PromptslipError, Result};
use crate::printer::{MAX_WIDTH_DOTS, PrinterConfig};
use crate::protocol::{commands, graphics};
use crate::render::Bitmap;
use crate::transport::{DeviceTransport, Transport};
#[cfg(feature = "usb")]
use crate::transport::usb::{UsbId, UsbTransport};

/// Default file the dummy printer writes captured ESC/POS to.
pub const DEFAULT_DUMMY_OUTPUT: &str = "output.escpos";

/// Write side of a printer.
pub trait PrinterSink: Send {
    /// Print a 1-bit image.
    fn image(&mut self, bitmap: &Bitmap) -> Result<()>;

    /// Print text. Callers pass sanitized ASCII.
    fn text(&mut self, text: &str) -> Result<()>;

    /// Feed and cut the paper.
    fn cut(&mut self) -> Result<()>;

    /// Release the printer. Sinks holding no resources keep the default.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Bytes the sink has captured, if it keeps them (the dummy printer).
    fn captured_output(&self) -> Option<&[u8]> {
        None
    }
}

/// ESC/POS encoder over a transport.
pub struct EscPosSink<T: Transport> {
    transport: T,
    config: PrinterConfig,
    initialized: bool,
}

impl<T: Transport> EscPosSink<T> {
    pub fn new(transport: T, config: PrinterConfig) -> Self {
        Self {
            transport,
            config,
            initialized: false,
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.initialized {
            self.initialized = true;
            self.transport.write_all(&commands::init()).map_err(write_error)?;
        }
        self.transport.write_all(bytes).map_err(write_error)
    }
}

fn write_error(e: io::Error) -> PromptslipError {
    PromptslipError::Sink(format!("Write failed: {}", e))
}

impl<T: Transport> PrinterSink for EscPosSink<T> {
    fn image(&mut self, bitmap: &Bitmap) -> Result<()> {
        debug!(
            width = bitmap.width(),
            height = bitmap.height(),
            "Sending raster image"
        );
        if bitmap.width() > MAX_WIDTH_DOTS {
            return Err(PromptslipError::InvalidImage(format!(
                "bitmap width {} exceeds the raster limit of {} dots",
                bitmap.width(),
                MAX_WIDTH_DOTS
            )));
        }
        for block in graphics::raster_blocks(bitmap, self.config.max_raster_rows) {
            self.send(&block)?;
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.send(&commands::text(text))
    }

    fn cut(&mut self) -> Result<()> {
        self.send(&commands::cut_full_feed(0))
    }

    fn close(&mut self) -> Result<()> {
        self.transport
            .close()
            .map_err(|e| PromptslipError::Sink(format!("Close failed: {}", e)))
    }

    fn captured_output(&self) -> Option<&[u8]> {
        self.transport.captured()
    }
}

/// The dummy printer: ESC/POS captured in memory.
pub type DummySink = EscPosSink<Vec<u8>>;

impl DummySink {
    pub fn dummy(config: PrinterConfig) -> Self {
        Self::new(Vec::new(), config)
    }
}

/// Which printer to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// Capture output in memory, optionally saving it after each job.
    Dummy { output: Option<PathBuf> },
    /// A device node such as `/dev/usb/lp0` or a serial tty.
    Device { path: PathBuf, baud: Option<u32> },
    /// Raw USB. `None` auto-detects.
    #[cfg(feature = "usb")]
    Usb { id: Option<UsbId> },
}

impl SinkConfig {
    pub fn describe(&self) -> String {
        match self {
            Self::Dummy { output: Some(path) } => format!("dummy (saving to {})", path.display()),
            Self::Dummy { output: None } => "dummy".to_string(),
            Self::Device { path, .. } => format!("device {}", path.display()),
            #[cfg(feature = "usb")]
            Self::Usb { id: Some(id) } => format!("usb {}", id),
            #[cfg(feature = "usb")]
            Self::Usb { id: None } => "usb (auto-detect)".to_string(),
        }
    }
}

/// Open the printer named by `sink`.
pub fn open_sink(sink: &SinkConfig, printer: PrinterConfig) -> Result<Box<dyn PrinterSink>> {
    match sink {
        SinkConfig::Dummy { .. } => Ok(Box::new(DummySink::dummy(printer))),
        SinkConfig::Device { path, baud } => {
            let transport = DeviceTransport::open(path, *baud)?;
            Ok(Box::new(EscPosSink::new(transport, printer)))
        }
        #[cfg(feature = "usb")]
        SinkConfig::Usb { id } => {
            let transport = match id {
                Some(id) => UsbTransport::open(*id)?,
                None => UsbTransport::open_auto()?,
            };
            Ok(Box::new(EscPosSink::new(transport, printer)))
        }
    }
}

/// Save captured dummy output to the configured file.
///
/// Does nothing unless the sink exposes captured bytes and the config names an
/// output path. Returns the path written.
pub fn persist_capture(sink: &dyn PrinterSink, config: &SinkConfig) -> Result<Option<PathBuf>> {
    let (Some(bytes), SinkConfig::Dummy { output: Some(path) }) = (sink.captured_output(), config)
    else {
        return Ok(None);
    };

    fs::write(path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Saved dummy printer output");
    Ok(Some(path.clone()))
}
