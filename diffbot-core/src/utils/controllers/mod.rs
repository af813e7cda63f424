//! Module Exports
//!
//! This file exports the motor control modules and the tick-driven
//! `SystemController` that ties the serial link to the wheels.
//!
//! - `motor`: H-bridge channels, the `MotorOutput` sink and the `MotorActuator`.

pub mod motor;

use core::{fmt, ops::ControlFlow};

use embassy_time::{Duration, Ticker};
use embedded_io::{ErrorType, Read, ReadReady, Write};

pub use motor::{
    ActuatorError, Direction, HBridgeChannel, HBridgeError, MotionCommand, MotorActuator,
    MotorChannel, MotorOutput, Polarity, Speed, SpeedOutOfRange,
};

use crate::utils::{
    connection::{protocol::BANNER, serial},
    math::drive,
};

/// Runtime configuration, fixed for the life of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveConfig {
    /// Duty applied to every motion command.
    pub speed: Speed,
    /// Forward polarity of the left channel.
    pub left: Polarity,
    /// Forward polarity of the right channel.
    pub right: Polarity,
    /// Drive an explicit Stop right after the banner.
    pub stop_on_start: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            speed: Speed::MAX,
            left: Polarity::Inverted,
            right: Polarity::Normal,
            stop_on_start: true,
        }
    }
}

impl DriveConfig {
    /// Defaults with optional overrides.
    pub fn new(
        speed: Option<Speed>,
        stop_on_start: Option<bool>,
    ) -> Self {
        let defaults = DriveConfig::default();
        DriveConfig {
            speed: speed.unwrap_or(defaults.speed),
            stop_on_start: stop_on_start.unwrap_or(defaults.stop_on_start),
            ..defaults
        }
    }
}

/// Outcome of a single control tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing was waiting on the serial link.
    Idle,
    /// A byte arrived that is not a command; outputs untouched.
    Ignored(u8),
    /// A command was decoded and applied to both channels.
    Applied(MotionCommand),
}

/// Errors surfaced by a control tick.
#[derive(Debug)]
pub enum ControlError<S: fmt::Debug, M: fmt::Debug> {
    Serial(S),
    Motor(M),
}

/// Error type of `SystemController::run_once` for the given link and channels.
pub type TickError<RX, L, R> = ControlError<
    <RX as ErrorType>::Error,
    ActuatorError<<L as MotorOutput>::Error, <R as MotorOutput>::Error>,
>;

/// Command interpreter plus motor actuator, stepped one tick at a time.
pub struct SystemController<RX, TX, L, R> {
    rx: RX,
    tx: TX,
    actuator: MotorActuator<L, R>,
    speed: Speed,
    stop_on_start: bool,
}

impl<RX, TX, L, R> SystemController<RX, TX, L, R>
where
    RX: Read + ReadReady,
    TX: Write,
    L: MotorOutput,
    R: MotorOutput,
{
    pub fn new(
        rx: RX,
        tx: TX,
        actuator: MotorActuator<L, R>,
        config: &DriveConfig,
    ) -> Self {
        SystemController {
            rx,
            tx,
            actuator,
            speed: config.speed,
            stop_on_start: config.stop_on_start,
        }
    }

    /// Emit the startup banner and, if configured, park both motors.
    pub fn start(&mut self) -> Result<(), TickError<RX, L, R>> {
        for line in BANNER {
            tracing::info!("{}", line);
            self.report(line);
        }
        if self.stop_on_start {
            self.actuator.stop().map_err(ControlError::Motor)?;
            tracing::debug!("Motors parked at zero duty");
        }
        Ok(())
    }

    /// Poll the link once and act on at most one byte.
    pub fn run_once(&mut self) -> Result<Tick, TickError<RX, L, R>> {
        let Some(byte) = serial::poll(&mut self.rx).map_err(ControlError::Serial)? else {
            return Ok(Tick::Idle);
        };

        let Some(command) = MotionCommand::from_byte(byte) else {
            tracing::trace!("Ignoring byte 0x{:02X}", byte);
            return Ok(Tick::Ignored(byte));
        };

        let setpoint = drive::setpoint(command, self.speed);
        self.actuator
            .apply_setpoint(setpoint)
            .map_err(ControlError::Motor)?;
        tracing::info!(
            ?command,
            left = ?setpoint.left.direction(),
            right = ?setpoint.right.direction(),
            duty = setpoint.left.duty().get(),
            "{}",
            command.status()
        );
        self.report(command.status());
        Ok(Tick::Applied(command))
    }

    /// Tick every `period`, handing each outcome to `on_tick`.
    ///
    /// Failed ticks are logged and the loop carries on; it ends only when
    /// `on_tick` breaks.
    pub async fn run<F>(
        &mut self,
        period: Duration,
        mut on_tick: F,
    ) where
        F: FnMut(&Result<Tick, TickError<RX, L, R>>) -> ControlFlow<()>,
    {
        let mut ticker = Ticker::every(period);
        tracing::info!("Control loop running every {}ms", period.as_millis());
        loop {
            let outcome = self.run_once();
            if let Err(e) = &outcome {
                tracing::error!("Control tick failed: {:?}", e);
            }
            if on_tick(&outcome).is_break() {
                break;
            }
            ticker.next().await;
        }
        tracing::info!("Control loop stopped");
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Give back the serial halves and the actuator.
    pub fn release(self) -> (RX, TX, MotorActuator<L, R>) {
        (self.rx, self.tx, self.actuator)
    }

    fn report(
        &mut self,
        line: &str,
    ) {
        if let Err(e) = serial::write_line(&mut self.tx, line) {
            tracing::warn!("Status line not sent: {:?}", e);
        }
    }
}
