//! PWM adapter: bridges `embedded-hal` PWM outputs to the [`ActuatorPort`].
//!
//! Holds one output per channel behind an `embassy-sync` blocking mutex,
//! so the dispatcher (period setup, reset zeroing) and the channel's
//! actuation task can both reach it.  Fractions are mapped onto the
//! output's native duty range here; nothing above this layer knows the
//! PWM resolution.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::app::ports::ActuatorPort;
use crate::channel::Channel;
use crate::error::ActuatorError;

/// Period control, which `embedded-hal` 1.0 leaves out of its PWM traits.
pub trait PeriodControl: ErrorType {
    fn set_period(&mut self, period: Duration) -> Result<(), Self::Error>;
}

type Slot<P> = Mutex<CriticalSectionRawMutex, RefCell<P>>;

/// Concrete adapter over two PWM outputs.
pub struct PwmAdapter<P> {
    outputs: [Slot<P>; Channel::COUNT],
}

impl<P: SetDutyCycle + PeriodControl + Send> PwmAdapter<P> {
    pub fn new(led1: P, led2: P) -> Self {
        Self {
            outputs: [Mutex::new(RefCell::new(led1)), Mutex::new(RefCell::new(led2))],
        }
    }

    fn with_output<R>(&self, channel: Channel, f: impl FnOnce(&mut P) -> R) -> R {
        self.outputs[channel.index()].lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Read-only access to one output (diagnostics and tests).
    pub fn inspect<R>(&self, channel: Channel, f: impl FnOnce(&P) -> R) -> R {
        self.outputs[channel.index()].lock(|cell| f(&cell.borrow()))
    }
}

/// Scale a `[0, 1]` fraction onto `0..=max`.
pub fn fraction_to_duty(fraction: f32, max: u16) -> u16 {
    (fraction.clamp(0.0, 1.0) * f32::from(max)).round() as u16
}

impl<P: SetDutyCycle + PeriodControl + Send> ActuatorPort for PwmAdapter<P> {
    fn set_duty(&self, channel: Channel, fraction: f32) -> Result<(), ActuatorError> {
        self.with_output(channel, |out| {
            let duty = fraction_to_duty(fraction, out.max_duty_cycle());
            out.set_duty_cycle(duty)
                .map_err(|_| ActuatorError::PwmWriteFailed)
        })
    }

    fn configure_period(&self, channel: Channel, period: Duration) -> Result<(), ActuatorError> {
        self.with_output(channel, |out| {
            out.set_period(period)
                .map_err(|_| ActuatorError::PeriodUnsupported)
        })
    }
}
