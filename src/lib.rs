//! UartPwm controller library.
//!
//! Exposes the frame codec, command parser, dispatcher, and channel task
//! registry for integration testing and fuzzing.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channel;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod serial;
pub mod tasks;
