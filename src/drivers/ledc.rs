//! LEDC channel as an `embedded-hal` PWM output.
//!
//! Each [`LedcOutput`] owns one LEDC channel.  Duty goes through the
//! standard [`SetDutyCycle`] trait so the [`PwmAdapter`] can drive any HAL
//! PWM pin; period changes go through [`PeriodControl`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real LEDC registers via hw_init.
//! On host/test: writes the simulated registers in `hw_init::sim`.
//!
//! [`PwmAdapter`]: crate::adapters::pwm::PwmAdapter

use core::time::Duration;

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};
use log::warn;

use crate::adapters::pwm::PeriodControl;
use crate::drivers::hw_init;

/// One configured LEDC channel.
#[derive(Debug)]
pub struct LedcOutput {
    channel: u32,
    duty: u16,
}

impl LedcOutput {
    /// Wrap a channel already set up by [`hw_init::init_ledc`].
    pub fn new(channel: u32) -> Self {
        Self { channel, duty: 0 }
    }

    pub fn current_duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for LedcOutput {
    type Error = ErrorKind;
}

impl SetDutyCycle for LedcOutput {
    fn max_duty_cycle(&self) -> u16 {
        hw_init::LEDC_MAX_DUTY as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let duty = duty.min(self.max_duty_cycle());
        hw_init::ledc_set(self.channel, u32::from(duty)).map_err(|rc| {
            warn!("LEDC CH{} duty write failed (rc={})", self.channel, rc);
            ErrorKind::Other
        })?;
        self.duty = duty;
        Ok(())
    }
}

impl PeriodControl for LedcOutput {
    /// Both channels share timer 0, so this retimes the pair.
    fn set_period(&mut self, period: Duration) -> Result<(), Self::Error> {
        hw_init::ledc_set_period(period).map_err(|e| {
            warn!("LEDC CH{}: {}", self.channel, e);
            ErrorKind::Other
        })
    }
}
