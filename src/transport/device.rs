//! # Character Device Transport
//!
//! Writes to a printer exposed as a device node:
//!
//! - `/dev/usb/lp0`: the kernel `usblp` driver (most USB receipt printers)
//! - `/dev/ttyUSB0`, `/dev/ttyS0`: serial printers
//!
//! ## TTY Configuration
//!
//! When the device is a terminal it is switched to raw mode so binary raster
//! data is transmitted without modification:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)
//!
//! An optional baud rate is applied to both directions. The CLI passes
//! [`DEFAULT_BAUD`] unless told otherwise. Non-tty devices ignore it.
//!
//! ## Chunked Writes
//!
//! Large writes are split into 4096-byte chunks with a short pause between
//! them so slow serial printers are not overrun.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use super::Transport;
use crate::error::PromptslipError;

/// Default device path for USB printers bound to the `usblp` driver
pub const DEFAULT_DEVICE: &str = "/dev/usb/lp0";

/// Serial speed the CLI uses when `--baud` is not given
pub const DEFAULT_BAUD: u32 = 9600;

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Device File Transport
///
/// ## Example
///
/// ```no_run
/// use std::io::Write;
/// use promptslip::transport::DeviceTransport;
/// use promptslip::protocol::commands;
///
/// let mut transport = DeviceTransport::open("/dev/usb/lp0", None)?;
/// transport.write_all(&commands::init())?;
///
/// # Ok::<(), promptslip::error::PromptslipError>(())
/// ```
pub struct DeviceTransport {
    file: File,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl DeviceTransport {
    /// Open a printer device.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need the `lp` or `dialout` group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P, baud: Option<u32>) -> Result<Self, PromptslipError> {
        let path = device.as_ref();

        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            PromptslipError::Transport(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if is_tty(&file) {
            configure_tty_raw(&file, baud)?;
        }

        Ok(Self {
            file,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks. Default is 2ms.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }
}

impl Write for DeviceTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() <= self.chunk_size {
            return self.file.write(buf);
        }
        self.write_all(buf)?;
        Ok(buf.len())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if data.len() <= self.chunk_size {
            return self.file.write_all(data);
        }

        for chunk in data.chunks(self.chunk_size) {
            self.file.write_all(chunk)?;
            if !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Transport for DeviceTransport {
    fn close(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all().or_else(|e| {
            // Character devices commonly reject fsync
            if e.kind() == io::ErrorKind::InvalidInput {
                Ok(())
            } else {
                Err(e)
            }
        })
    }
}

#[cfg(unix)]
fn is_tty(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::isatty(file.as_raw_fd()) == 1 }
}

#[cfg(not(unix))]
fn is_tty(_file: &File) -> bool {
    false
}

/// Map a numeric baud rate to the termios speed constant.
#[cfg(unix)]
fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    Some(match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        _ => return None,
    })
}

/// Configure a terminal for raw 8-bit output.
///
/// Note: IXON/IXOFF/IXANY disable XON/XOFF software flow control. This is critical
/// because 0x11 (XON/DC1) and 0x13 (XOFF/DC3) can appear in binary raster data.
#[cfg(unix)]
fn configure_tty_raw(file: &File, baud: Option<u32>) -> Result<(), PromptslipError> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(PromptslipError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    if let Some(baud) = baud {
        let speed = baud_constant(baud).ok_or_else(|| {
            PromptslipError::Config(format!("Unsupported baud rate {}", baud))
        })?;
        unsafe {
            libc::cfsetispeed(&mut termios, speed);
            libc::cfsetospeed(&mut termios, speed);
        }
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(PromptslipError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File, _baud: Option<u32>) -> Result<(), PromptslipError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device_path() {
        assert_eq!(DEFAULT_DEVICE, "/dev/usb/lp0");
    }

    #[test]
    fn test_missing_device_is_transport_error() {
        let err = DeviceTransport::open("/nonexistent/printer0", None)
            .err()
            .expect("opening a missing device must fail");
        assert!(matches!(err, PromptslipError::Transport(_)));
        assert!(err.to_string().contains("/nonexistent/printer0"));
    }

    #[cfg(unix)]
    #[test]
    fn test_baud_constants() {
        assert_eq!(baud_constant(9600), Some(libc::B9600));
        assert_eq!(baud_constant(12345), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_writes_to_regular_file() {
        let path = std::env::temp_dir().join(format!("promptslip-device-{}", std::process::id()));
        std::fs::write(&path, b"").unwrap();

        let mut transport = DeviceTransport::open(&path, None).unwrap();
        transport.set_chunk_size(3);
        transport.set_chunk_delay(Duration::ZERO);
        transport.write_all(b"hello world").unwrap();
        transport.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
        std::fs::remove_file(&path).ok();
    }
}
