//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to
//! the `log` facade (the ESP-IDF console in production).

use log::{debug, error, info, warn};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControllerEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Started => {
                info!("START | dispatcher running");
            }
            ControllerEvent::FrameRejected(e) => {
                warn!("FRAME | rejected: {}", e);
            }
            ControllerEvent::DutyCommanded {
                channel,
                fraction,
                clamped,
            } => {
                if *clamped {
                    warn!("DUTY  | {} = {:.2}% (clamped)", channel, fraction * 100.0);
                } else {
                    info!("DUTY  | {} = {:.2}%", channel, fraction * 100.0);
                }
            }
            ControllerEvent::TaskStarted(channel) => {
                info!("TASK  | {} started", channel);
            }
            ControllerEvent::TaskRestarted(channel) => {
                warn!("TASK  | {} restarted after unexpected exit", channel);
            }
            ControllerEvent::TaskFailed(e) => {
                error!("TASK  | {}", e);
            }
            ControllerEvent::ChannelsReset(stopped) => {
                info!("RESET | stopped {:?}, outputs zeroed", stopped.as_slice());
            }
            ControllerEvent::UnknownCommand(keyword) => {
                debug!("CMD   | ignoring unknown keyword '{}'", keyword.as_str());
            }
        }
    }
}
