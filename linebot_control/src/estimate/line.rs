//! Line position estimator.
//!
//! Converts the 16 normalized readings into a scalar position in `[-1, 1]`
//! (sensor-array units, negative = line to the left). Both algorithms are
//! seeded with the previous estimate so that a second dark patch far from
//! the current belief does not capture the estimate.

use linebot_common::consts::{NUM_SENSORS, sensor_position};
use serde::{Deserialize, Serialize};

/// Sensors further than this from the previous estimate carry no weight in
/// the weighted centroid.
pub const LOCALITY_GATE: f64 = 0.3;

/// Number of evenly spaced candidates searched by the likelihood estimator.
pub const NUM_CANDIDATES: usize = 1000;

/// Weight of the smoothness prior `(candidate − previous)²`.
pub const PRIOR_WEIGHT: f64 = 4.0;

/// Selectable estimation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineAlgorithm {
    #[default]
    WeightedCentroid,
    MaximumLikelihood,
}

/// Triangular sensor response at distance `d` from the line.
#[inline]
pub fn sensor_response(d: f64) -> f64 {
    (1.0 - 3.0 * d.abs()).max(0.0)
}

/// Position of candidate `i` in `[-1, 1]`.
#[inline]
pub fn candidate_position(i: usize) -> f64 {
    i as f64 * 2.0 / (NUM_CANDIDATES - 1) as f64 - 1.0
}

/// Line position estimator with precomputed geometry.
#[derive(Debug, Clone)]
pub struct LineEstimator {
    algorithm: LineAlgorithm,
    sensors: [f64; NUM_SENSORS],
    candidates: Vec<f64>,
}

impl LineEstimator {
    pub fn new(algorithm: LineAlgorithm) -> Self {
        let sensors = std::array::from_fn(sensor_position);
        let candidates = (0..NUM_CANDIDATES).map(candidate_position).collect();
        Self {
            algorithm,
            sensors,
            candidates,
        }
    }

    pub fn algorithm(&self) -> LineAlgorithm {
        self.algorithm
    }

    /// Estimate the line position given the previous estimate.
    pub fn estimate(&self, readings: &[f64; NUM_SENSORS], previous: f64) -> f64 {
        match self.algorithm {
            LineAlgorithm::WeightedCentroid => self.weighted_centroid(readings, previous),
            LineAlgorithm::MaximumLikelihood => self.maximum_likelihood(readings, previous),
        }
    }

    /// Reading-weighted mean of sensor positions within the locality gate.
    ///
    /// Returns `previous` unchanged when no gated sensor carries weight.
    pub fn weighted_centroid(&self, readings: &[f64; NUM_SENSORS], previous: f64) -> f64 {
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for (&position, &reading) in self.sensors.iter().zip(readings) {
            if (position - previous).abs() > LOCALITY_GATE {
                continue;
            }
            weighted_sum += reading * position;
            weight_sum += reading;
        }

        if weight_sum == 0.0 {
            return previous;
        }
        weighted_sum / weight_sum
    }

    /// Candidate minimizing prior plus squared residual to the response
    /// model. Ties keep the lowest candidate.
    pub fn maximum_likelihood(&self, readings: &[f64; NUM_SENSORS], previous: f64) -> f64 {
        let mut best_cost = f64::INFINITY;
        let mut best = previous;
        for &candidate in &self.candidates {
            let prior = candidate - previous;
            let mut cost = PRIOR_WEIGHT * prior * prior;
            for (&position, &reading) in self.sensors.iter().zip(readings) {
                let residual = reading - sensor_response(candidate - position);
                cost += residual * residual;
            }
            if cost < best_cost {
                best_cost = cost;
                best = candidate;
            }
        }
        best
    }
}

impl Default for LineEstimator {
    fn default() -> Self {
        Self::new(LineAlgorithm::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(index: usize, value: f64) -> [f64; NUM_SENSORS] {
        let mut r = [0.0; NUM_SENSORS];
        r[index] = value;
        r
    }

    /// Readings the response model predicts for a line at `at`.
    fn ideal(at: f64) -> [f64; NUM_SENSORS] {
        std::array::from_fn(|i| sensor_response(at - sensor_position(i)))
    }

    #[test]
    fn centroid_single_sensor_inside_gate() {
        let est = LineEstimator::new(LineAlgorithm::WeightedCentroid);
        let p = sensor_position(9);
        let out = est.estimate(&single(9, 1.0), p - 0.1);
        assert!((out - p).abs() < 1e-12);
    }

    #[test]
    fn centroid_gate_rejects_far_sensor() {
        let est = LineEstimator::new(LineAlgorithm::WeightedCentroid);
        // Sensor 15 at +1.0, previous at 0.0: outside the gate.
        assert_eq!(est.estimate(&single(15, 1.0), 0.0), 0.0);
    }

    #[test]
    fn centroid_zero_weight_keeps_previous() {
        let est = LineEstimator::new(LineAlgorithm::WeightedCentroid);
        assert_eq!(est.estimate(&[0.0; NUM_SENSORS], 0.42), 0.42);
    }

    #[test]
    fn centroid_averages_symmetric_pair() {
        let est = LineEstimator::new(LineAlgorithm::WeightedCentroid);
        let mut r = [0.0; NUM_SENSORS];
        r[7] = 0.5;
        r[8] = 0.5;
        assert!(est.estimate(&r, 0.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_ignores_distant_marker() {
        let est = LineEstimator::new(LineAlgorithm::WeightedCentroid);
        let mut r = ideal(0.0);
        r[0] = 1.0;
        r[1] = 1.0;
        assert!(est.estimate(&r, 0.0).abs() < 1e-12);
    }

    #[test]
    fn likelihood_recovers_ideal_line() {
        let est = LineEstimator::new(LineAlgorithm::MaximumLikelihood);
        for &at in &[-0.5, 0.0, 0.3, 0.8] {
            let out = est.estimate(&ideal(at), at);
            assert!((out - at).abs() < 2.0 / (NUM_CANDIDATES - 1) as f64, "{at} -> {out}");
        }
    }

    #[test]
    fn likelihood_prior_pulls_towards_previous() {
        let est = LineEstimator::new(LineAlgorithm::MaximumLikelihood);
        // Evidence says 0.3, belief says 0.0: the estimate lands in between,
        // much closer to the evidence.
        let out = est.estimate(&ideal(0.3), 0.0);
        assert!(out > 0.2 && out < 0.3, "{out}");
    }

    #[test]
    fn likelihood_result_is_a_candidate() {
        let est = LineEstimator::new(LineAlgorithm::MaximumLikelihood);
        let out = est.estimate(&ideal(0.123), 0.1);
        let hit = (0..NUM_CANDIDATES).any(|i| candidate_position(i) == out);
        assert!(hit);
    }

    #[test]
    fn candidate_grid_endpoints() {
        assert_eq!(candidate_position(0), -1.0);
        assert!((candidate_position(NUM_CANDIDATES - 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn response_model() {
        assert_eq!(sensor_response(0.0), 1.0);
        assert!((sensor_response(0.1) - 0.7).abs() < 1e-12);
        assert_eq!(sensor_response(-0.5), 0.0);
    }

    #[test]
    fn algorithm_from_toml() {
        #[derive(serde::Deserialize)]
        struct W {
            algorithm: LineAlgorithm,
        }
        let w: W = toml::from_str("algorithm = \"maximum_likelihood\"").unwrap();
        assert_eq!(w.algorithm, LineAlgorithm::MaximumLikelihood);
    }
}
