//! Hardware abstraction layer interfaces.
//!
//! The control stack only ever talks to hardware through the port traits in
//! [`ports`]. A [`driver::HalDriver`] hands out one set of ports at init.

pub mod clock;
pub mod config;
pub mod driver;
pub mod ports;
