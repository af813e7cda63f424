//! Utility re-exports and helper macros for the differential-drive bot.
//!
//! - `connection`: serial command protocol and byte-source adapters
//! - `controllers`: H-bridge motor channels and the tick-driven system controller
//! - `math`: differential-drive mapping from motion commands to channel setpoints
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod connection;
pub mod controllers;
pub mod math;

pub use connection::serial::{poll, PipeRx};
pub use controllers::{DriveConfig, MotionCommand, Speed, SystemController, Tick};
pub use embassy_time::{Duration, Ticker};
pub use math::drive::{setpoint, ChannelSetpoint, DriveSetpoint};

#[doc(hidden)]
pub use static_cell::StaticCell;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `StaticCell` for type `$t` and initializes it with
/// `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::utils::StaticCell<$t> = $crate::utils::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
