//! First-order IIR low-pass filter: `y = y·(1 − α) + x·α`.

/// Low-pass filter state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPass {
    alpha: f64,
    value: f64,
}

impl LowPass {
    /// Create a filter with smoothing factor `alpha` in `[0, 1]`, output 0.
    pub fn new(alpha: f64) -> Self {
        Self { alpha, value: 0.0 }
    }

    /// Set the output directly, typically from the first raw reading.
    #[inline]
    pub fn prime(&mut self, value: f64) {
        self.value = value;
    }

    /// Feed one sample and return the new output.
    #[inline]
    pub fn apply(&mut self, input: f64) -> f64 {
        self.value = self.value * (1.0 - self.alpha) + input * self.alpha;
        self.value
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primed_filter_holds_constant_input() {
        let mut lp = LowPass::new(0.01);
        lp.prime(8.0);
        for _ in 0..100 {
            lp.apply(8.0);
        }
        assert!((lp.value() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn single_step_weights() {
        let mut lp = LowPass::new(0.01);
        lp.prime(8.0);
        let y = lp.apply(7.0);
        assert!((y - (8.0 * 0.99 + 7.0 * 0.01)).abs() < 1e-12);
    }

    #[test]
    fn converges_towards_step() {
        let mut lp = LowPass::new(0.1);
        for _ in 0..200 {
            lp.apply(1.0);
        }
        assert!((lp.value() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn alpha_one_passes_through() {
        let mut lp = LowPass::new(1.0);
        assert_eq!(lp.apply(3.5), 3.5);
        assert_eq!(lp.alpha(), 1.0);
    }
}
