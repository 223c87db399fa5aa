//! # ESC/POS Protocol Commands
//!
//! Command builders for the ESC/POS protocol spoken by most receipt printers
//! (Epson TM series and the many compatible USB/serial printers).
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `GS V m n`, `GS v 0 m xL xH yL yH d1...dk`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for graphics and paper cutting.
pub const GS: u8 = 0x1D;

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on default state.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ```
/// use promptslip::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Feed and Full Cut (GS V B n)
///
/// Feeds paper to the cutting position plus `n` motion units, then cuts.
/// The printer accounts for the head-to-cutter distance itself.
///
/// | Format  | Bytes        |
/// |---------|--------------|
/// | ASCII   | GS V B n     |
/// | Hex     | 1D 56 42 n   |
///
/// ```
/// use promptslip::protocol::commands;
///
/// assert_eq!(commands::cut_full_feed(0), vec![0x1D, 0x56, 0x42, 0x00]);
/// ```
#[inline]
pub fn cut_full_feed(n: u8) -> Vec<u8> {
    vec![GS, b'V', b'B', n]
}

/// # Text Bytes
///
/// Text is sent as-is. Callers are expected to pass sanitized ASCII; any
/// other character is replaced with `?` so it cannot form a command.
pub fn text(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| {
            if c == '\n' || (' '..='~').contains(&c) {
                c as u8
            } else {
                b'?'
            }
        })
        .collect()
}

/// Encode a `u16` as little-endian bytes.
#[inline]
pub fn u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}
