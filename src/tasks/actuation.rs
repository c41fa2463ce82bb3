//! Per-channel actuation loop.
//!
//! Every cycle the task copies its channel's commanded duty to the PWM
//! output, then parks for one interval.  Cancellation is cooperative:
//! the registry raises the stop flag and unparks the thread, and the
//! loop exits before its next write.
//!
//! ```text
//!   ┌──────────────┐ load  ┌───────────┐ set_duty ┌──────────────┐
//!   │  DutyCell    │──────▶│ loop body │─────────▶│ ActuatorPort │
//!   └──────────────┘       └───────────┘          └──────────────┘
//!                            ▲   park_timeout(interval)
//!                            └── stop flag / unpark
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::app::ports::{ActuatorPort, TaskSpawner};
use crate::channel::{Channel, DutyCell};
use crate::error::TaskError;

/// State moved into the task thread.
pub struct ActuationTask<A: ActuatorPort + 'static> {
    channel: Channel,
    duty: Arc<DutyCell>,
    actuator: Arc<A>,
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl<A: ActuatorPort + 'static> ActuationTask<A> {
    pub fn new(channel: Channel, duty: Arc<DutyCell>, actuator: Arc<A>, interval: Duration) -> Self {
        Self {
            channel,
            duty,
            actuator,
            interval,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Hand the loop to `spawner` and keep the cancellation side.
    pub fn spawn(self, spawner: &mut impl TaskSpawner) -> io::Result<ActuationHandle> {
        let channel = self.channel;
        let stop = Arc::clone(&self.stop);
        let thread = spawner.spawn(channel.task_name(), Box::new(move || self.run()))?;
        Ok(ActuationHandle {
            channel,
            stop,
            thread,
        })
    }

    /// The loop body.  Returns once the stop flag is observed.
    pub fn run(self) {
        info!("{}: actuation loop running ({:?} cycle)", self.channel, self.interval);
        let mut write_failed = false;

        while !self.stop.load(Ordering::Acquire) {
            match self.actuator.set_duty(self.channel, self.duty.load()) {
                Ok(()) => write_failed = false,
                // Report the first failure of a streak only.
                Err(e) if !write_failed => {
                    warn!("{}: duty write failed: {}", self.channel, e);
                    write_failed = true;
                }
                Err(_) => {}
            }
            thread::park_timeout(self.interval);
        }

        debug!("{}: actuation loop stopped", self.channel);
    }
}

/// Registry-side handle to a running actuation task.
#[derive(Debug)]
pub struct ActuationHandle {
    channel: Channel,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ActuationHandle {
    /// The task has returned (normally or by panic).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Request a stop and wake the task if it is parked.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
        self.thread.thread().unpark();
    }

    /// Wait for the task to exit.  After this returns the task issues no
    /// further driver writes.
    pub fn join(self) -> Result<(), TaskError> {
        self.thread
            .join()
            .map_err(|_| TaskError::Panicked(self.channel))
    }

    /// [`cancel`](Self::cancel) then [`join`](Self::join).
    pub fn stop(self) -> Result<(), TaskError> {
        self.cancel();
        self.join()
    }
}
