//! Outbound controller events.
//!
//! The [`Dispatcher`](super::service::Dispatcher) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use heapless::Vec;

use crate::channel::Channel;
use crate::error::{ParseError, TaskError};

use super::commands::Keyword;

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The dispatcher is about to enter its loop.
    Started,

    /// A delimited frame did not parse; nothing was dispatched.
    FrameRejected(ParseError),

    /// A channel's commanded duty was updated.
    DutyCommanded {
        channel: Channel,
        fraction: f32,
        /// The requested percentage was outside `[0, 100]`.
        clamped: bool,
    },

    /// A new actuation task is running for `channel`.
    TaskStarted(Channel),

    /// A dead task was reaped and replaced.
    TaskRestarted(Channel),

    /// The runtime refused to create a task; `channel` stays idle.
    TaskFailed(TaskError),

    /// A reset stopped these channels' tasks and zeroed every output.
    ChannelsReset(Vec<Channel, { Channel::COUNT }>),

    /// A well-formed command with a keyword nobody handles.
    UnknownCommand(Keyword),
}
