//! Application core: command semantics with no direct I/O.
//!
//! This module turns parsed frames into duty updates and task lifecycle
//! steps.  Hardware, threads, and logging are reached only through the
//! **port traits** in [`ports`], so the whole dispatch path runs under
//! host tests with in-memory fakes.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
