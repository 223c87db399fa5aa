//! # ESC/POS Protocol
//!
//! Byte-level command builders. Nothing here performs I/O; the builders return
//! `Vec<u8>` that a [`Transport`](crate::transport::Transport) writes out.
//!
//! ## Modules
//!
//! - [`commands`]: Init, text, feed and cut commands
//! - [`graphics`]: `GS v 0` raster images

pub mod commands;
pub mod graphics;
