//! Unified error types for the UartPwm firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! bring-up path and the dispatcher's error handling uniform.  All variants
//! are `Copy` so they can be carried in events and outcomes without
//! allocation.

use core::fmt;

use crate::channel::Channel;
use crate::config::ConfigError;
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A frame payload could not be turned into a command.
    Parse(ParseError),
    /// A PWM output rejected a write or configuration change.
    Actuator(ActuatorError),
    /// An actuation task could not be started or died.
    Task(TaskError),
    /// Peripheral bring-up failed.
    Init(HwInitError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Task(e) => write!(f, "task: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Why a delimited frame payload was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Payload did not split into exactly `index:keyword:data`.
    MalformedFrame,
    /// Index field is empty or not an unsigned decimal number.
    InvalidIndex,
    /// Data field is missing or not a finite number where one is required.
    InvalidData,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedFrame => write!(f, "malformed frame"),
            Self::InvalidIndex => write!(f, "invalid index field"),
            Self::InvalidData => write!(f, "invalid data field"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// The output cannot run at the requested period.
    PeriodUnsupported,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::PeriodUnsupported => write!(f, "PWM period unsupported"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Task errors
// ---------------------------------------------------------------------------

/// Actuation task lifecycle failures.  `SpawnFailed` is the only one that
/// is escalated to the operator; the channel stays idle afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// The runtime could not create the task (resource exhaustion).
    SpawnFailed(Channel),
    /// The task panicked instead of observing cancellation.
    Panicked(Channel),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpawnFailed(ch) => write!(f, "{ch} task creation failed"),
            Self::Panicked(ch) => write!(f, "{ch} task panicked"),
        }
    }
}

impl From<TaskError> for Error {
    fn from(e: TaskError) -> Self {
        Self::Task(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
