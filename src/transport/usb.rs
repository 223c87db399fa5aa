//! # USB Transport
//!
//! Talks to a receipt printer directly over libusb, claiming the interface
//! that owns its bulk OUT endpoint. This works without the `usblp` kernel
//! driver (which is detached automatically when present).
//!
//! ## Device Selection
//!
//! With no explicit vendor/product id, the transport scans the bus for the
//! first device whose vendor id belongs to a known receipt-printer maker. If
//! nothing is found, or opening the detected device fails, it makes one more
//! attempt with [`FALLBACK_ID`].

use rusb::{Context, Device, DeviceHandle, Direction, TransferType, UsbContext};
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Transport;
use crate::error::PromptslipError;

/// Vendor/product id pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl UsbId {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Parse `VVVV:PPPP` (hex, optional `0x` prefixes).
    pub fn parse(s: &str) -> Result<Self, String> {
        let (vendor, product) = s
            .split_once(':')
            .ok_or_else(|| format!("Expected VENDOR:PRODUCT, got '{}'", s))?;
        Ok(Self::new(parse_hex(vendor)?, parse_hex(product)?))
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vendor_id, self.product_id)
    }
}

fn parse_hex(s: &str) -> Result<u16, String> {
    let digits = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|_| format!("Invalid hex id '{}'", s))
}

/// Id tried when auto-detection finds nothing or the detected device fails.
pub const FALLBACK_ID: UsbId = UsbId::new(0x0FE6, 0x811E);

/// Vendor ids of common ESC/POS receipt printer makers.
pub const KNOWN_VENDORS: &[u16] = &[
    0x0FE6, // ICS Advent (rebadged generic thermal printers)
    0x04B8, // Seiko Epson
    0x0519, // Star Micronics
    0x0DD4, // Custom Engineering
    0x154F, // SNBC
    0x0416, // Winbond (many POS-58/POS-80 clones)
    0x28E9, // GD32 based clones
    0x1504, // Bixolon
    0x1FC9, // NXP based clones
];

/// Bulk transfer timeout.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pick the first device made by a known receipt-printer vendor.
pub fn pick_candidate(devices: &[UsbId]) -> Option<UsbId> {
    devices
        .iter()
        .copied()
        .find(|id| KNOWN_VENDORS.contains(&id.vendor_id))
}

/// Open the detected device, retrying once with [`FALLBACK_ID`].
///
/// `open` is attempted at most twice. The fallback attempt happens when
/// `detected` is `None` or when opening the detected device fails.
pub fn open_with_fallback<T, F>(detected: Option<UsbId>, mut open: F) -> Result<(UsbId, T), PromptslipError>
where
    F: FnMut(UsbId) -> Result<T, PromptslipError>,
{
    if let Some(id) = detected {
        match open(id) {
            Ok(handle) => return Ok((id, handle)),
            Err(e) => warn!(%id, error = %e, "Detected printer failed to open, trying fallback id"),
        }
    } else {
        warn!(fallback = %FALLBACK_ID, "No known printer detected, trying fallback id");
    }

    open(FALLBACK_ID).map(|handle| (FALLBACK_ID, handle))
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    iface: u8,
    address: u8,
}

/// # USB Bulk Transport
pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    endpoint: Endpoint,
    claimed: bool,
}

impl UsbTransport {
    /// Open a specific device.
    pub fn open(id: UsbId) -> Result<Self, PromptslipError> {
        let context = Context::new().map_err(usb_error)?;
        let device = context
            .devices()
            .map_err(usb_error)?
            .iter()
            .find(|device| {
                device
                    .device_descriptor()
                    .map(|d| d.vendor_id() == id.vendor_id && d.product_id() == id.product_id)
                    .unwrap_or(false)
            })
            .ok_or_else(|| PromptslipError::Transport(format!("USB printer {} not found", id)))?;

        let endpoint = find_bulk_out(&device)
            .ok_or_else(|| PromptslipError::Transport(format!("USB printer {} has no bulk OUT endpoint", id)))?;

        let mut handle = device.open().map_err(usb_error)?;
        // Not supported on every platform
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!(error = %e, "Kernel driver auto-detach unavailable");
        }
        handle.claim_interface(endpoint.iface).map_err(usb_error)?;

        info!(%id, iface = endpoint.iface, address = endpoint.address, "Opened USB printer");
        Ok(Self {
            handle,
            endpoint,
            claimed: true,
        })
    }

    /// Scan the bus and open the first known printer, falling back to
    /// [`FALLBACK_ID`].
    pub fn open_auto() -> Result<Self, PromptslipError> {
        let detected = match list_devices() {
            Ok(devices) => pick_candidate(&devices),
            Err(e) => {
                warn!(error = %e, "USB enumeration failed");
                None
            }
        };
        open_with_fallback(detected, Self::open).map(|(_, transport)| transport)
    }
}

/// Vendor/product ids of every device on the bus.
pub fn list_devices() -> Result<Vec<UsbId>, PromptslipError> {
    let context = Context::new().map_err(usb_error)?;
    let devices = context.devices().map_err(usb_error)?;
    Ok(devices
        .iter()
        .filter_map(|device| device.device_descriptor().ok())
        .map(|d| UsbId::new(d.vendor_id(), d.product_id()))
        .collect())
}

fn find_bulk_out(device: &Device<Context>) -> Option<Endpoint> {
    let device_desc = device.device_descriptor().ok()?;
    for n in 0..device_desc.num_configurations() {
        let Ok(config_desc) = device.config_descriptor(n) else {
            continue;
        };
        for interface in config_desc.interfaces() {
            for interface_desc in interface.descriptors() {
                for endpoint_desc in interface_desc.endpoint_descriptors() {
                    if endpoint_desc.direction() == Direction::Out
                        && endpoint_desc.transfer_type() == TransferType::Bulk
                    {
                        return Some(Endpoint {
                            iface: interface_desc.interface_number(),
                            address: endpoint_desc.address(),
                        });
                    }
                }
            }
        }
    }
    None
}

fn usb_error(e: rusb::Error) -> PromptslipError {
    PromptslipError::Transport(format!("USB error: {}", e))
}

impl Write for UsbTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle
            .write_bulk(self.endpoint.address, buf, WRITE_TIMEOUT)
            .map_err(|e| io::Error::other(format!("USB write failed: {}", e)))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for UsbTransport {
    fn close(&mut self) -> io::Result<()> {
        if self.claimed {
            self.claimed = false;
            self.handle
                .release_interface(self.endpoint.iface)
                .map_err(|e| io::Error::other(format!("USB release failed: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_parse_id() {
        assert_eq!(UsbId::parse("0fe6:811e").unwrap(), FALLBACK_ID);
        assert_eq!(UsbId::parse("0x04B8:0x0202").unwrap(), UsbId::new(0x04B8, 0x0202));
        assert!(UsbId::parse("04b8").is_err());
        assert!(UsbId::parse("zz:01").is_err());
        assert_eq!(FALLBACK_ID.to_string(), "0FE6:811E");
    }

    #[test]
    fn test_pick_candidate_known_vendor() {
        let devices = [
            UsbId::new(0x1D6B, 0x0002), // root hub
            UsbId::new(0x046D, 0xC52B), // mouse receiver
            UsbId::new(0x04B8, 0x0202), // Epson
        ];
        assert_eq!(pick_candidate(&devices), Some(UsbId::new(0x04B8, 0x0202)));
    }

    #[test]
    fn test_pick_candidate_none() {
        assert_eq!(pick_candidate(&[UsbId::new(0x1D6B, 0x0002)]), None);
        assert_eq!(pick_candidate(&[]), None);
    }

    #[test]
    fn test_detected_device_used() {
        let calls = RefCell::new(Vec::new());
        let detected = UsbId::new(0x0FE6, 0x811E);
        let (id, handle) = open_with_fallback(Some(detected), |id| {
            calls.borrow_mut().push(id);
            Ok("printer")
        })
        .unwrap();
        assert_eq!(id, detected);
        assert_eq!(handle, "printer");
        assert_eq!(calls.into_inner(), vec![detected]);
    }

    #[test]
    fn test_fallback_when_nothing_detected() {
        let calls = RefCell::new(Vec::new());
        let (id, _) = open_with_fallback(None, |id| {
            calls.borrow_mut().push(id);
            Ok(())
        })
        .unwrap();
        assert_eq!(id, FALLBACK_ID);
        assert_eq!(calls.into_inner(), vec![FALLBACK_ID]);
    }

    #[test]
    fn test_fallback_when_detected_fails() {
        let calls = RefCell::new(Vec::new());
        let detected = UsbId::new(0x04B8, 0x0202);
        let (id, _) = open_with_fallback(Some(detected), |id| {
            calls.borrow_mut().push(id);
            if calls.borrow().len() == 1 {
                Err(PromptslipError::Transport("Connection failed".to_string()))
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(id, FALLBACK_ID);
        assert_eq!(calls.into_inner(), vec![detected, FALLBACK_ID]);
    }

    #[test]
    fn test_both_attempts_fail() {
        let mut attempts = 0;
        let result: Result<(UsbId, ()), _> = open_with_fallback(Some(UsbId::new(1, 2)), |_| {
            attempts += 1;
            Err(PromptslipError::Transport("nope".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(attempts, 2);
    }
}
