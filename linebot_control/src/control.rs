//! Control engine root.
//!
//! Wheel speed PID and the signal filters used around it.

pub mod filters;
pub mod pid;
