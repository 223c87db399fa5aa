//! # Printer Transport Layer
//!
//! Byte pipes between the ESC/POS encoder and a printer.
//!
//! ## Available Transports
//!
//! - `Vec<u8>`: in-memory capture, used by the dummy printer
//! - [`device`]: character devices (`/dev/usb/lp0`) and serial ttys
//! - [`usb`]: raw USB bulk transfers via libusb (feature `usb`)

pub mod device;
#[cfg(feature = "usb")]
pub mod usb;

pub use device::DeviceTransport;
#[cfg(feature = "usb")]
pub use usb::UsbTransport;

use std::io::{self, Write};

/// A byte sink that can be flushed and released.
pub trait Transport: Write + Send {
    /// Bytes written so far, for transports that keep them.
    ///
    /// This is the capability the dummy printer exposes; hardware transports
    /// return `None`.
    fn captured(&self) -> Option<&[u8]> {
        None
    }

    /// Flush and release the underlying handle.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Transport for Vec<u8> {
    fn captured(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}
