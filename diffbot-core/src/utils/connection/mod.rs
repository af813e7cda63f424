//! Module Exports
//!
//! This file exports the modules that carry commands in from the serial link.
//!
//! # Modules
//! - `protocol`: single-byte command decoding and status text.
//! - `serial`: non-blocking byte polling and transport adapters.

pub mod protocol;
pub mod serial;
