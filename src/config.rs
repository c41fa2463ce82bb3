//! Controller configuration parameters
//!
//! All tunable parameters for the UartPwm controller.  The firmware uses
//! the defaults unless a JSON override is baked in at build time.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drivers::hw_init::period_to_hz;

/// Line rates the UART bring-up accepts.
pub const SUPPORTED_BAUD_RATES: [u32; 6] = [9_600, 19_200, 38_400, 57_600, 115_200, 230_400];

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Link ---
    /// UART line rate (8N1, no flow control)
    pub baud_rate: u32,
    /// Write diagnostic echo lines back over the link
    pub echo_diagnostics: bool,

    // --- PWM ---
    /// PWM period handed to the driver at startup (milliseconds)
    pub pwm_period_ms: u32,

    // --- Timing ---
    /// Actuation task cycle (milliseconds)
    pub actuation_interval_ms: u32,
    /// Dispatcher sleep while the link is idle (milliseconds)
    pub poll_interval_ms: u32,

    // --- Tasks ---
    /// Actuation task stack size (KiB)
    pub task_stack_kb: u32,
    /// Actuation task priority (device only)
    pub task_priority: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Link
            baud_rate: 9_600,
            echo_diagnostics: false,

            // PWM
            pwm_period_ms: 10, // 100 Hz

            // Timing
            actuation_interval_ms: 10,
            poll_interval_ms: 10,

            // Tasks
            task_stack_kb: 4,
            task_priority: 5,
        }
    }
}

/// Errors from loading or validating a [`ControllerConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON text did not deserialize.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ControllerConfig {
    /// Parse a JSON override.  Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the hardware or the task model cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(ConfigError::ValidationFailed("baud_rate not supported"));
        }
        if self.pwm_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("pwm_period_ms must be > 0"));
        }
        if period_to_hz(self.pwm_period()).is_none() {
            return Err(ConfigError::ValidationFailed("pwm_period_ms must be 1..=12"));
        }
        if self.actuation_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("actuation_interval_ms must be > 0"));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > 1_000 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be 1..=1000"));
        }
        if self.task_stack_kb < 2 {
            return Err(ConfigError::ValidationFailed("task_stack_kb must be >= 2"));
        }
        Ok(())
    }

    pub fn pwm_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.pwm_period_ms))
    }

    pub fn actuation_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.actuation_interval_ms))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }
}
