//! Linebot Common Library
//!
//! Shared vocabulary for every crate in the linebot workspace: operating
//! modes, hardware port traits, configuration loading and the calibration
//! file format.
//!
//! # Module Structure
//!
//! - [`mode`] - Operating mode bitset (`Mode`)
//! - [`consts`] - Sensor array geometry and actuator limits
//! - [`config`] - Configuration loading traits and types
//! - [`calibration`] - Sensor calibration bounds and their on-disk layout
//! - [`hal`] - Hardware port traits, driver trait and HAL configuration
//! - [`timing`] - Fixed-interval gate used by periodic services
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use linebot_common::prelude::*;
//!
//! let mask = Mode::DRIVE | Mode::IDLE;
//! assert!(mask.intersects(Mode::DRIVE));
//! assert!(!Mode::ALL.contains(Mode::HALT));
//! ```

pub mod calibration;
pub mod config;
pub mod consts;
pub mod hal;
pub mod mode;
pub mod prelude;
pub mod timing;
