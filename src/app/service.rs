//! Dispatcher: the control loop at the core of the controller.
//!
//! [`Dispatcher`] owns the frame reader, the channel task registry, the
//! serial link, and the event sink.  Each iteration pulls at most one
//! frame, parses it, and applies it to the registry.  Per-frame errors
//! are reported and dropped; nothing a client sends can end the loop.
//!
//! ```text
//!  Transport ──▶ FrameReader ──▶ parse ──▶ ┌────────────┐ ──▶ EventSink
//!      ▲                                   │ Dispatcher │
//!      └──────── ACK / echo ───────────────┤            │──▶ ChannelTaskRegistry
//!                                          └────────────┘
//! ```

use core::fmt::Write as _;
use core::time::Duration;
use std::thread;

use heapless::{String, Vec};
use log::{info, warn};

use crate::channel::{Channel, percent_to_fraction};
use crate::config::ControllerConfig;
use crate::drivers::task_pin::ThreadSpawner;
use crate::error::{ParseError, TaskError};
use crate::serial::codec::{FrameReader, FrameStats};
use crate::serial::parser::parse;
use crate::serial::transport::Transport;
use crate::tasks::registry::{ChannelTaskRegistry, TaskStatus};

use super::commands::{Command, CommandKind};
use super::events::ControllerEvent;
use super::ports::{ActuatorPort, EventSink, TaskSpawner};

/// Longest diagnostic echo line, newline excluded.
const ECHO_LINE_LEN: usize = 64;

/// Third field of a payload that already parsed, as sent.
fn data_field(payload: &[u8]) -> &str {
    core::str::from_utf8(payload)
        .ok()
        .and_then(|text| text.split(crate::serial::parser::SEPARATOR).nth(2))
        .unwrap_or("")
}

/// What a single frame did.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Parse failed; no state changed.
    Rejected(ParseError),
    /// Duty updated; `task` reports the lifecycle step for the channel.
    DutySet {
        channel: Channel,
        fraction: f32,
        task: Result<TaskStatus, TaskError>,
    },
    /// All tasks stopped; lists the channels that had one.
    Reset { stopped: Vec<Channel, { Channel::COUNT }> },
    /// Unknown keyword; no state changed.
    Ignored,
}

/// The main control loop.
pub struct Dispatcher<T, A, S, W = ThreadSpawner>
where
    T: Transport,
    A: ActuatorPort + 'static,
    S: EventSink,
    W: TaskSpawner,
{
    transport: T,
    reader: FrameReader,
    registry: ChannelTaskRegistry<A, W>,
    sink: S,
    echo: bool,
    poll_interval: Duration,
}

impl<T, A, S, W> Dispatcher<T, A, S, W>
where
    T: Transport,
    A: ActuatorPort + 'static,
    S: EventSink,
    W: TaskSpawner,
{
    pub fn new(
        config: &ControllerConfig,
        transport: T,
        registry: ChannelTaskRegistry<A, W>,
        sink: S,
    ) -> Self {
        Self {
            transport,
            reader: FrameReader::new(),
            registry,
            sink,
            echo: config.echo_diagnostics,
            poll_interval: config.poll_interval(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the controller on the link (echo only) and to the sink.
    pub fn start(&mut self) {
        self.echo(format_args!("UartPwm serial PWM controller v{}", env!("CARGO_PKG_VERSION")));
        self.echo(format_args!("Tasks: dispatcher, pwm-led1, pwm-led2"));
        self.echo(format_args!("Commands: #0:LED1:<0-100>$ #0:LED2:<0-100>$ #0:RES:NULL$"));
        self.sink.emit(&ControllerEvent::Started);
        info!("Dispatcher started (echo={})", self.echo);
    }

    /// Serve the link forever, sleeping `poll_interval` whenever it is idle.
    pub fn run(&mut self) -> ! {
        self.start();
        loop {
            if self.poll().is_none() {
                thread::sleep(self.poll_interval);
            }
        }
    }

    // ── Per-frame handling ────────────────────────────────────

    /// Process at most one frame.  `None` means the link had no complete
    /// frame.
    pub fn poll(&mut self) -> Option<DispatchOutcome> {
        let payload = self.reader.next_frame(&mut self.transport)?;
        Some(self.dispatch(&payload))
    }

    /// Parse and apply one frame payload (markers already stripped).
    pub fn dispatch(&mut self, payload: &[u8]) -> DispatchOutcome {
        self.echo(format_args!(
            "{}",
            core::str::from_utf8(payload).unwrap_or("<non-utf8 frame>")
        ));

        match parse(payload) {
            Ok(command) => {
                self.echo(format_args!("Number:  {}", command.index));
                self.echo(format_args!("Command: {}", command.kind.keyword()));
                self.echo(format_args!("Data:    {}", data_field(payload)));
                self.execute(&command)
            }
            Err(e) => {
                self.sink.emit(&ControllerEvent::FrameRejected(e));
                DispatchOutcome::Rejected(e)
            }
        }
    }

    /// Apply a parsed command to the registry.
    pub fn execute(&mut self, command: &Command) -> DispatchOutcome {
        match &command.kind {
            CommandKind::SetDuty { channel, percent } => {
                let channel = *channel;
                let (fraction, clamped) = percent_to_fraction(*percent);

                // Duty first, so a fresh task's first cycle reads it.
                self.registry.set_duty(channel, fraction);
                self.sink.emit(&ControllerEvent::DutyCommanded {
                    channel,
                    fraction,
                    clamped,
                });
                self.echo(format_args!("{} Value: {:.2}%", channel, fraction * 100.0));

                let task = self.registry.ensure_running(channel);
                match task {
                    Ok(TaskStatus::Started) => self.sink.emit(&ControllerEvent::TaskStarted(channel)),
                    Ok(TaskStatus::Restarted) => {
                        self.sink.emit(&ControllerEvent::TaskRestarted(channel));
                    }
                    Ok(TaskStatus::AlreadyRunning) => {}
                    Err(e) => {
                        self.sink.emit(&ControllerEvent::TaskFailed(e));
                        self.echo(format_args!("ERROR: {}", e));
                    }
                }

                DispatchOutcome::DutySet {
                    channel,
                    fraction,
                    task,
                }
            }
            CommandKind::Reset => {
                let stopped = self.registry.terminate_all();
                for ch in &stopped {
                    self.echo(format_args!("{} task stopped", ch));
                }
                self.sink.emit(&ControllerEvent::ChannelsReset(stopped.clone()));
                DispatchOutcome::Reset { stopped }
            }
            CommandKind::Unrecognized(keyword) => {
                self.sink.emit(&ControllerEvent::UnknownCommand(keyword.clone()));
                DispatchOutcome::Ignored
            }
        }
    }

    /// Write one diagnostic line to the link when echo is enabled.
    /// Lines longer than the echo buffer are cut short.
    fn echo(&mut self, args: core::fmt::Arguments<'_>) {
        if !self.echo {
            return;
        }
        let mut line: String<ECHO_LINE_LEN> = String::new();
        let _ = line.write_fmt(args);
        let _ = self
            .transport
            .write(line.as_bytes())
            .and_then(|_| self.transport.write(b"\n"))
            .map_err(|e| warn!("echo write failed: {:?}", e));
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn registry(&self) -> &ChannelTaskRegistry<A, W> {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.reader.stats()
    }
}
