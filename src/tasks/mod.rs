//! Actuation task lifecycle: the per-channel loops and the registry that
//! starts, keeps, and stops them.

pub mod actuation;
pub mod registry;
