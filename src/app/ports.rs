//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dispatcher / ChannelTaskRegistry (domain)
//! ```
//!
//! Driven adapters (PWM outputs, event sinks, task runtime) implement
//! these traits.  The domain consumes them via generics, so it never
//! touches hardware or the thread API directly.  The serial link has its
//! own port, [`Transport`](crate::serial::transport::Transport).

use core::time::Duration;
use std::io;
use std::thread::JoinHandle;

use crate::channel::Channel;
use crate::error::ActuatorError;

use super::events::ControllerEvent;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → PWM hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the two PWM outputs.
///
/// Shared between the dispatcher thread and every actuation task, hence
/// `&self` methods and the `Send + Sync` bound.  Implementations serialise
/// access per channel themselves.
pub trait ActuatorPort: Send + Sync {
    /// Drive `channel` at `fraction` of full scale (`0.0..=1.0`).
    fn set_duty(&self, channel: Channel, fraction: f32) -> Result<(), ActuatorError>;

    /// Set the PWM period of `channel`.
    fn configure_period(&self, channel: Channel, period: Duration) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ControllerEvent`]s through this port.
/// Adapters decide where they go (serial log, test recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &ControllerEvent);
}

// ───────────────────────────────────────────────────────────────
// Task spawner port (driven adapter: domain → RTOS threads)
// ───────────────────────────────────────────────────────────────

/// Boxed body of an actuation task.
pub type TaskBody = Box<dyn FnOnce() + Send + 'static>;

/// Creates the OS task backing one actuation loop.
///
/// An `Err` means the runtime is out of resources; the registry reports
/// it and leaves the channel idle.
pub trait TaskSpawner {
    /// Start `body` on a new task called `name` (null-terminated).
    fn spawn(&mut self, name: &'static str, body: TaskBody) -> io::Result<JoinHandle<()>>;
}
