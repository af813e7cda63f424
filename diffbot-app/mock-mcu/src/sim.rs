//! Simulated H-bridge pins.
//!
//! Each pin records its level in a shared cell so the app can snapshot the
//! whole channel after a tick, and logs every transition.

use std::cell::Cell;
use std::convert::Infallible;
use std::io::Write as _;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use serde::Serialize;
use tracing::{debug, trace};

/// Resolution of the simulated PWM timer (10-bit, like many MCU timers).
const PWM_TOP: u16 = 1023;

/// Output pin that logs level changes.
pub struct SimPin {
    name: &'static str,
    leg: &'static str,
    level: Rc<Cell<bool>>,
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

impl SimPin {
    fn set(
        &mut self,
        high: bool,
    ) {
        if self.level.replace(high) != high {
            trace!(channel = self.name, leg = self.leg, high, "pin changed");
        }
    }
}

/// PWM output that logs duty changes.
pub struct SimPwm {
    name: &'static str,
    duty: Rc<Cell<u16>>,
}

impl pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        PWM_TOP
    }

    fn set_duty_cycle(
        &mut self,
        duty: u16,
    ) -> Result<(), Self::Error> {
        if self.duty.replace(duty) != duty {
            debug!(channel = self.name, duty, top = PWM_TOP, "duty changed");
        }
        Ok(())
    }
}

/// Pin levels of one channel at a point in time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelPins {
    pub duty: u16,
    pub dir_a: bool,
    pub dir_b: bool,
}

/// Read-only view of a simulated channel.
#[derive(Clone)]
pub struct ChannelProbe {
    duty: Rc<Cell<u16>>,
    dir_a: Rc<Cell<bool>>,
    dir_b: Rc<Cell<bool>>,
}

impl ChannelProbe {
    pub fn snapshot(&self) -> ChannelPins {
        ChannelPins {
            duty: self.duty.get(),
            dir_a: self.dir_a.get(),
            dir_b: self.dir_b.get(),
        }
    }
}

/// Build the enable/dir-A/dir-B triple for a channel plus a probe onto it.
pub fn channel_pins(name: &'static str) -> (SimPwm, SimPin, SimPin, ChannelProbe) {
    let probe = ChannelProbe {
        duty: Rc::new(Cell::new(0)),
        dir_a: Rc::new(Cell::new(false)),
        dir_b: Rc::new(Cell::new(false)),
    };
    (
        SimPwm {
            name,
            duty: probe.duty.clone(),
        },
        SimPin {
            name,
            leg: "a",
            level: probe.dir_a.clone(),
        },
        SimPin {
            name,
            leg: "b",
            level: probe.dir_b.clone(),
        },
        probe,
    )
}

/// Serial TX backed by stdout.
pub struct StdoutTx(std::io::Stdout);

impl StdoutTx {
    pub fn new() -> Self {
        StdoutTx(std::io::stdout())
    }
}

impl embedded_io::ErrorType for StdoutTx {
    type Error = std::io::Error;
}

impl embedded_io::Write for StdoutTx {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> Result<usize, Self::Error> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}
