//! Channel task registry: owns per-channel duty cells and task handles.
//!
//! Mutated only from the dispatcher thread.  The only cross-thread state
//! is each channel's [`DutyCell`] and the stop flag inside its
//! [`ActuationHandle`].
//!
//! Invariant: at most one live actuation task per channel.

use core::time::Duration;
use std::sync::Arc;

use heapless::Vec;
use log::{error, info, warn};

use crate::app::ports::{ActuatorPort, TaskSpawner};
use crate::channel::{Channel, DutyCell};
use crate::drivers::task_pin::ThreadSpawner;
use crate::error::TaskError;

use super::actuation::{ActuationHandle, ActuationTask};

/// What [`ChannelTaskRegistry::ensure_running`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// No task was registered; one was created.
    Started,
    /// A live task already serves the channel; nothing changed.
    AlreadyRunning,
    /// The registered task had exited on its own and was replaced.
    Restarted,
}

/// Per-channel state.
#[derive(Debug, Default)]
pub struct ChannelState {
    duty: Arc<DutyCell>,
    task: Option<ActuationHandle>,
}

impl ChannelState {
    pub fn commanded_duty(&self) -> f32 {
        self.duty.load()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

/// Tracks the actuation task of every channel.
pub struct ChannelTaskRegistry<A: ActuatorPort + 'static, W: TaskSpawner = ThreadSpawner> {
    actuator: Arc<A>,
    spawner: W,
    interval: Duration,
    channels: [ChannelState; Channel::COUNT],
}

impl<A: ActuatorPort + 'static, W: TaskSpawner> ChannelTaskRegistry<A, W> {
    /// Configure every output for `period`, drive it to zero, and start
    /// with no tasks.  Driver failures here are logged, not fatal: the
    /// channel may still work once commanded.
    pub fn new(actuator: Arc<A>, spawner: W, period: Duration, interval: Duration) -> Self {
        for ch in Channel::ALL {
            if let Err(e) = actuator.configure_period(ch, period) {
                warn!("{}: configure_period({:?}) failed: {}", ch, period, e);
            }
            if let Err(e) = actuator.set_duty(ch, 0.0) {
                warn!("{}: initial zero write failed: {}", ch, e);
            }
        }

        Self {
            actuator,
            spawner,
            interval,
            channels: Default::default(),
        }
    }

    /// Update the commanded duty.  Safe whether or not a task is running.
    pub fn set_duty(&self, channel: Channel, fraction: f32) {
        self.channels[channel.index()].duty.store(fraction);
    }

    /// Make sure a task is driving `channel`.
    ///
    /// A running task is left alone; it picks up the new duty on its next
    /// cycle.  On spawn failure the channel stays idle and the error is
    /// returned for reporting.
    pub fn ensure_running(&mut self, channel: Channel) -> Result<TaskStatus, TaskError> {
        let state = &mut self.channels[channel.index()];

        let mut status = TaskStatus::Started;
        if let Some(handle) = state.task.take() {
            if !handle.is_finished() {
                state.task = Some(handle);
                return Ok(TaskStatus::AlreadyRunning);
            }
            if let Err(e) = handle.join() {
                warn!("reaped dead task: {}", e);
            }
            status = TaskStatus::Restarted;
        }

        let task = ActuationTask::new(
            channel,
            Arc::clone(&state.duty),
            Arc::clone(&self.actuator),
            self.interval,
        );
        match task.spawn(&mut self.spawner) {
            Ok(handle) => {
                state.task = Some(handle);
                info!("{}: actuation task {:?}", channel, status);
                Ok(status)
            }
            Err(e) => {
                error!("ERROR: {} task creation failed: {}", channel, e);
                Err(TaskError::SpawnFailed(channel))
            }
        }
    }

    /// Stop every running task, wait for each to exit, and zero both the
    /// commanded duty and the driver output of every channel.
    ///
    /// Returns the channels whose tasks were stopped.  When this returns,
    /// no actuation task will write to the driver again.
    pub fn terminate_all(&mut self) -> Vec<Channel, { Channel::COUNT }> {
        // Signal everything first so the tasks wind down in parallel.
        for state in &self.channels {
            if let Some(handle) = &state.task {
                handle.cancel();
            }
        }

        let mut stopped = Vec::new();
        for ch in Channel::ALL {
            if let Some(handle) = self.channels[ch.index()].task.take() {
                if let Err(e) = handle.join() {
                    warn!("{}", e);
                }
                // Capacity equals the channel count.
                let _ = stopped.push(ch);
            }
        }

        // Every task has exited; these are the last writes.
        for ch in Channel::ALL {
            self.channels[ch.index()].duty.store(0.0);
            if let Err(e) = self.actuator.set_duty(ch, 0.0) {
                warn!("{}: zero write failed: {}", ch, e);
            }
        }
        stopped
    }

    pub fn channel(&self, channel: Channel) -> &ChannelState {
        &self.channels[channel.index()]
    }

    pub fn commanded_duty(&self, channel: Channel) -> f32 {
        self.channel(channel).commanded_duty()
    }

    pub fn is_running(&self, channel: Channel) -> bool {
        self.channel(channel).is_running()
    }

    pub fn running_count(&self) -> usize {
        self.channels.iter().filter(|s| s.is_running()).count()
    }
}

impl<A: ActuatorPort + 'static, W: TaskSpawner> Drop for ChannelTaskRegistry<A, W> {
    fn drop(&mut self) {
        if self.running_count() > 0 {
            self.terminate_all();
        }
    }
}
