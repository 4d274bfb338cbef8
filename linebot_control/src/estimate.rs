//! Estimators turning raw sensor data into vehicle quantities.
//!
//! - [`line`] - Line position from the normalized reflectance array
//! - [`marker`] - Track marker episodes beside the line
//! - [`quadrature`] - Wheel position from encoder edges

pub mod line;
pub mod marker;
pub mod quadrature;
