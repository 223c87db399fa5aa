//! HTTP handlers for the server.

pub mod banner;
pub mod pages;
pub mod print;
