//! Core-pinned thread spawning for ESP32 dual-core.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread` creates a FreeRTOS
//! task pinned to a specific CPU core with explicit priority and stack
//! size. On non-ESP targets, falls back to a plain named thread.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.  Only the dispatcher
//! thread spawns actuation tasks.

use std::io;
use std::thread::JoinHandle;

use crate::app::ports::{TaskBody, TaskSpawner};
use crate::config::ControllerConfig;

/// Core 1 (APP_CPU).  Core 0 keeps the protocol stacks and the console.
pub const APP_CORE: i32 = 1;

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// The `name` parameter must be a null-terminated string (e.g.
/// `"pwm-led1\0"`).  Creation failure (out of task memory) is returned,
/// not panicked on.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: i32,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct is fully initialised by the IDF helper and
    // `name` is 'static and null-terminated; the setting is consumed by
    // the spawn below on this same thread.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
        }
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on core {} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: i32,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::debug!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}

/// [`TaskSpawner`] that puts actuation loops on the application core.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSpawner {
    core: i32,
    priority: u8,
    stack_kb: usize,
}

impl ThreadSpawner {
    pub fn new(core: i32, priority: u8, stack_kb: usize) -> Self {
        Self {
            core,
            priority,
            stack_kb,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(APP_CORE, config.task_priority, config.task_stack_kb as usize)
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

impl TaskSpawner for ThreadSpawner {
    fn spawn(&mut self, name: &'static str, body: TaskBody) -> io::Result<JoinHandle<()>> {
        spawn_on_core(self.core, self.priority, self.stack_kb, name, body)
    }
}
