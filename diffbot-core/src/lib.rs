//! Serial-commanded differential-drive control for two-wheeled robots on no-std platforms.
//!
//! For a host-side run against simulated pins, see `diffbot-app/mock-mcu`.
#![no_std]

pub mod utils;
