//! Vehicle-wide constants.
//!
//! Single source of truth for sensor array geometry and actuator limits.

/// Number of reflectance sensors on the front array.
pub const NUM_SENSORS: usize = 16;

/// Largest motor duty magnitude accepted by the motor port.
pub const MOTOR_LIMIT: f64 = 0.95;

/// Encoder counts per wheel revolution (quadrature edges).
pub const COUNTS_PER_REV: u32 = 4096;

/// Full-scale value of a raw sensor sample (12-bit ADC).
pub const SENSOR_RAW_MAX: u16 = 4095;

/// Default calibration file name.
pub const DEFAULT_CALIBRATION_FILE: &str = "calibration.bin";

/// Lateral position of sensor `index`, evenly spaced across `[-1, 1]`.
///
/// Index 0 is the leftmost sensor (`-1.0`), index 15 the rightmost (`1.0`).
#[inline]
pub fn sensor_position(index: usize) -> f64 {
    index as f64 * 2.0 / (NUM_SENSORS - 1) as f64 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_positions_span_unit_interval() {
        assert!((sensor_position(0) + 1.0).abs() < 1e-12);
        assert!((sensor_position(NUM_SENSORS - 1) - 1.0).abs() < 1e-12);
        for i in 1..NUM_SENSORS {
            assert!(sensor_position(i) > sensor_position(i - 1));
        }
    }

    #[test]
    fn sensor_positions_are_symmetric() {
        for i in 0..NUM_SENSORS {
            let mirrored = sensor_position(NUM_SENSORS - 1 - i);
            assert!((sensor_position(i) + mirrored).abs() < 1e-12);
        }
    }

    #[test]
    fn motor_limit_below_full_scale() {
        assert!(MOTOR_LIMIT > 0.0 && MOTOR_LIMIT < 1.0);
    }
}
