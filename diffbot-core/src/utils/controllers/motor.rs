//! H-bridge motor channels for the differential-drive bot.
//!
//! Each wheel is driven by one H-bridge leg: a PWM-capable enable pin sets the
//! duty cycle and two direction pins select the polarity. `MotorActuator` owns
//! both channels and turns `MotionCommand`s into pin writes.

use core::fmt;

use embedded_hal::{
    digital::{OutputPin, PinState},
    pwm::SetDutyCycle,
};
use serde::{Deserialize, Serialize};

use crate::utils::math::drive::{self, ChannelSetpoint, DriveSetpoint};

/// Motion command variants accepted from the serial link.
///
/// Serialized in snake case (`"turn_left"`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MotionCommand {
    /// Both wheels forward.
    Forward,
    /// Both wheels in reverse.
    Backward,
    /// Pivot left: left wheel reverse, right wheel forward.
    TurnLeft,
    /// Pivot right: left wheel forward, right wheel reverse.
    TurnRight,
    /// Zero duty on both wheels.
    Stop,
}

impl MotionCommand {
    pub const ALL: [MotionCommand; 5] = [
        MotionCommand::Forward,
        MotionCommand::Backward,
        MotionCommand::TurnLeft,
        MotionCommand::TurnRight,
        MotionCommand::Stop,
    ];
}

/// One of the two physical motors.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MotorChannel {
    Left,
    Right,
}

/// Rotation sense of a single wheel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn from_forward(forward: bool) -> Self {
        if forward {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

}

/// Which direction-pin pattern spins a channel forward.
///
/// Motors are often mounted mirrored, so one side usually needs `Inverted`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Forward is A high, B low.
    #[default]
    Normal,
    /// Forward is A low, B high.
    Inverted,
}

impl Polarity {
    /// Direction pin levels `(a, b)` for the requested direction.
    ///
    /// The two levels are always complementary.
    pub fn levels(
        self,
        direction: Direction,
    ) -> (PinState, PinState) {
        let a_high = matches!(
            (self, direction),
            (Polarity::Normal, Direction::Forward) | (Polarity::Inverted, Direction::Reverse)
        );
        if a_high {
            (PinState::High, PinState::Low)
        } else {
            (PinState::Low, PinState::High)
        }
    }
}

/// PWM duty magnitude in `[0, 255]`.
///
/// Values outside the range cannot be represented; use [`Speed::saturating`]
/// or `Speed::try_from` to convert wider integers.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(transparent)]
pub struct Speed(u8);

impl Speed {
    pub const ZERO: Speed = Speed(0);
    pub const MAX: Speed = Speed(u8::MAX);

    pub const fn new(duty: u8) -> Self {
        Speed(duty)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Clamp an arbitrary integer into the valid duty range.
    pub fn saturating(value: i32) -> Self {
        Speed(value.clamp(0, i32::from(u8::MAX)) as u8)
    }
}

impl From<u8> for Speed {
    fn from(duty: u8) -> Self {
        Speed(duty)
    }
}

impl TryFrom<i32> for Speed {
    type Error = SpeedOutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map(Speed)
            .map_err(|_| SpeedOutOfRange(value))
    }
}

/// Rejected speed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedOutOfRange(pub i32);

impl fmt::Display for SpeedOutOfRange {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "speed {} outside duty range 0..=255", self.0)
    }
}

/// Output sink for a single motor channel.
///
/// `HBridgeChannel` implements it over real pins; tests implement it with
/// recorders so the steering logic can run without hardware.
pub trait MotorOutput {
    type Error: fmt::Debug;

    /// Drive the direction pins for `direction`.
    fn set_direction(
        &mut self,
        direction: Direction,
    ) -> Result<(), Self::Error>;

    /// Apply `duty` to the enable pin.
    fn set_duty(
        &mut self,
        duty: Speed,
    ) -> Result<(), Self::Error>;
}

impl<T: MotorOutput + ?Sized> MotorOutput for &mut T {
    type Error = T::Error;

    fn set_direction(
        &mut self,
        direction: Direction,
    ) -> Result<(), Self::Error> {
        (**self).set_direction(direction)
    }

    fn set_duty(
        &mut self,
        duty: Speed,
    ) -> Result<(), Self::Error> {
        (**self).set_duty(duty)
    }
}

/// Errors raised by the pins behind an `HBridgeChannel`.
#[derive(Debug)]
pub enum HBridgeError<P: fmt::Debug, W: fmt::Debug> {
    Pin(P),
    Pwm(W),
}

/// One H-bridge leg: enable (PWM) plus two direction inputs.
pub struct HBridgeChannel<EN, A, B> {
    enable: EN,
    dir_a: A,
    dir_b: B,
    polarity: Polarity,
}

impl<EN, A, B, PE, WE> HBridgeChannel<EN, A, B>
where
    EN: SetDutyCycle<Error = WE>,
    A: OutputPin<Error = PE>,
    B: OutputPin<Error = PE>,
    PE: fmt::Debug,
    WE: fmt::Debug,
{
    /// Take ownership of the pins and put the leg in a safe state.
    ///
    /// Duty is set to zero, then both direction pins are driven low.
    pub fn new(
        enable: EN,
        dir_a: A,
        dir_b: B,
        polarity: Polarity,
    ) -> Result<Self, HBridgeError<PE, WE>> {
        let mut channel = HBridgeChannel {
            enable,
            dir_a,
            dir_b,
            polarity,
        };
        channel
            .enable
            .set_duty_cycle_fully_off()
            .map_err(HBridgeError::Pwm)?;
        channel.dir_a.set_low().map_err(HBridgeError::Pin)?;
        channel.dir_b.set_low().map_err(HBridgeError::Pin)?;
        Ok(channel)
    }

    /// Give the pins back, in the order they were passed to [`HBridgeChannel::new`].
    pub fn release(self) -> (EN, A, B) {
        (self.enable, self.dir_a, self.dir_b)
    }
}

impl<EN, A, B, PE, WE> MotorOutput for HBridgeChannel<EN, A, B>
where
    EN: SetDutyCycle<Error = WE>,
    A: OutputPin<Error = PE>,
    B: OutputPin<Error = PE>,
    PE: fmt::Debug,
    WE: fmt::Debug,
{
    type Error = HBridgeError<PE, WE>;

    fn set_direction(
        &mut self,
        direction: Direction,
    ) -> Result<(), Self::Error> {
        let (a, b) = self.polarity.levels(direction);
        // The pin going low is written first so A and B are never both high.
        if a == PinState::Low {
            self.dir_a.set_state(a).map_err(HBridgeError::Pin)?;
            self.dir_b.set_state(b).map_err(HBridgeError::Pin)?;
        } else {
            self.dir_b.set_state(b).map_err(HBridgeError::Pin)?;
            self.dir_a.set_state(a).map_err(HBridgeError::Pin)?;
        }
        Ok(())
    }

    fn set_duty(
        &mut self,
        duty: Speed,
    ) -> Result<(), Self::Error> {
        self.enable
            .set_duty_cycle_fraction(u16::from(duty.get()), u16::from(Speed::MAX.get()))
            .map_err(HBridgeError::Pwm)
    }
}

/// Errors from either side of the actuator.
#[derive(Debug)]
pub enum ActuatorError<L: fmt::Debug, R: fmt::Debug> {
    Left(L),
    Right(R),
}

/// Exclusive owner of both motor channels.
pub struct MotorActuator<L, R> {
    left: L,
    right: R,
}

impl<L, R> MotorActuator<L, R>
where
    L: MotorOutput,
    R: MotorOutput,
{
    pub fn new(
        left: L,
        right: R,
    ) -> Self {
        MotorActuator { left, right }
    }

    /// Drive one channel at `speed`, forward or in reverse.
    ///
    /// Direction pins are written before the duty is applied.
    pub fn set_channel(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
        forward: bool,
    ) -> Result<(), ActuatorError<L::Error, R::Error>> {
        let setpoint = ChannelSetpoint::Drive {
            direction: Direction::from_forward(forward),
            duty: speed,
        };
        match channel {
            MotorChannel::Left => apply(&mut self.left, setpoint).map_err(ActuatorError::Left),
            MotorChannel::Right => apply(&mut self.right, setpoint).map_err(ActuatorError::Right),
        }
    }

    /// Zero duty on both channels, leaving the direction pins alone.
    pub fn stop(&mut self) -> Result<(), ActuatorError<L::Error, R::Error>> {
        self.apply_setpoint(drive::setpoint(MotionCommand::Stop, Speed::ZERO))
    }

    /// Execute a `MotionCommand` at the given speed.
    pub fn execute_command(
        &mut self,
        command: MotionCommand,
        speed: Speed,
    ) -> Result<(), ActuatorError<L::Error, R::Error>> {
        self.apply_setpoint(drive::setpoint(command, speed))
    }

    /// Apply a precomputed setpoint, left channel first.
    ///
    /// Both channels are always written; a fault on the left does not keep
    /// the right from being released. The first error is returned.
    pub fn apply_setpoint(
        &mut self,
        setpoint: DriveSetpoint,
    ) -> Result<(), ActuatorError<L::Error, R::Error>> {
        let left = apply(&mut self.left, setpoint.left);
        let right = apply(&mut self.right, setpoint.right);
        left.map_err(ActuatorError::Left)?;
        right.map_err(ActuatorError::Right)
    }

    pub fn release(self) -> (L, R) {
        (self.left, self.right)
    }
}

fn apply<O: MotorOutput>(
    output: &mut O,
    setpoint: ChannelSetpoint,
) -> Result<(), O::Error> {
    match setpoint {
        ChannelSetpoint::Drive { direction, duty } => {
            output.set_direction(direction)?;
            output.set_duty(duty)
        }
        ChannelSetpoint::Release => output.set_duty(Speed::ZERO),
    }
}
