use std::f32::consts::PI;

use crate::config::LowPassConfig;
use crate::constants::{LP_CUTOFF_PREWARP_SCALE, LP_PASSBAND_ATTENUATION_DB};
use crate::error::Result;
use crate::signal_processing::Filter;

/// Fixed-coefficient low-pass IIR filter for loop smoothing
///
/// Digital equivalent of the analog prototype
///
/// \\[ F(s) = \frac{\Omega_c}{s + \Omega_c} \\]
///
/// obtained with the bilinear transform:
///
/// \\[ F(z) = \frac{b + b z^{-1}}{1 + a z^{-1}} \\]
///
/// The corner \\(\Omega_c\\) comes from the cutoff frequency scaled by ten,
/// tangent pre-warped, then corrected so the prototype is 3 dB down at the
/// pre-warped frequency. Coefficients are fixed for the filter's lifetime.
/// The design, including the pre-warp tangent, is computed in single precision.
///
/// Used to smooth CN0 estimates, but works on any scalar series sampled at
/// the loop rate.
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter {
    a: f32,
    b: f32,
    xn: f32,
    yn: f32,
}

impl LowPassFilter {
    /// Create a filter whose state is settled at `initial`
    ///
    /// # Arguments
    /// * `initial` - Starting output; a constant input equal to it passes unchanged
    /// * `cutoff_freq_hz` - Filter cut-off frequency in Hz
    /// * `loop_freq_hz` - Rate at which [`LowPassFilter::update`] is called, in Hz
    ///
    /// No validation is performed; see [`LowPassConfig::validate`].
    pub fn new(initial: f32, cutoff_freq_hz: f32, loop_freq_hz: f32) -> Self {
        let (a, b) = Self::design(cutoff_freq_hz, loop_freq_hz);
        Self {
            a,
            b,
            xn: initial * b,
            yn: initial,
        }
    }

    /// Create a filter from validated configuration
    pub fn from_config(initial: f32, config: &LowPassConfig) -> Result<Self> {
        config.validate()?;

        let filter = Self::new(initial, config.cutoff_freq_hz, config.loop_freq_hz);
        log::debug!(
            "Low-pass filter: cutoff {} Hz at {} Hz, a={:e} b={:e}",
            config.cutoff_freq_hz,
            config.loop_freq_hz,
            filter.a,
            filter.b
        );

        Ok(filter)
    }

    /// Derive the recursion coefficients `(a, b)`
    pub(crate) fn design(cutoff_freq_hz: f32, loop_freq_hz: f32) -> (f32, f32) {
        let ts = 1.0 / loop_freq_hz;
        let wp = LP_CUTOFF_PREWARP_SCALE * cutoff_freq_hz * 2.0 * PI * ts;
        let op = 1.0 / (PI * ts) * (wp / 2.0).tan();
        let ap = 10.0_f32.powf(-LP_PASSBAND_ATTENUATION_DB / 20.0);
        let oc = op / (1.0 / (ap * ap) - 1.0).sqrt();

        // tmp = -Oc*T keeps the pole at (Oc*T - 2) / (Oc*T + 2), inside the unit circle.
        let tmp = -(oc * ts);
        let b = -tmp / (2.0 - tmp);
        let a = (-2.0 - tmp) / (2.0 - tmp);

        (a, b)
    }

    /// Feed one value and return the filtered output
    pub fn update(&mut self, value: f32) -> f32 {
        let tmp = self.b * value;
        self.yn = tmp + self.xn - self.a * self.yn;
        self.xn = tmp;
        self.yn
    }

    /// Reset filter memory so it is settled at `initial`; coefficients are kept
    pub fn reinitialize(&mut self, initial: f32) {
        self.yn = initial;
        self.xn = initial * self.b;
    }

    /// Last output
    pub fn value(&self) -> f32 {
        self.yn
    }

    /// Recursion coefficients `(a, b)`
    pub fn coefficients(&self) -> (f32, f32) {
        (self.a, self.b)
    }
}

impl Filter for LowPassFilter {
    fn process(&mut self, sample: f32) -> f32 {
        self.update(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coefficients_are_stable() {
        for (cutoff, loop_hz) in [(0.1, 1000.0), (1.0, 1000.0), (0.1, 50.0), (2.0, 50.0)] {
            let (a, b) = LowPassFilter::new(0.0, cutoff, loop_hz).coefficients();
            assert!(a.abs() < 1.0, "|a| = {} for {cutoff} Hz @ {loop_hz} Hz", a.abs());
            assert!(b > 0.0 && b < 1.0);
            // DC gain of F(z) is 2b / (1 + a).
            assert_relative_eq!(2.0 * b / (1.0 + a), 1.0, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_corner_matches_prewarp_formula() {
        let loop_hz = 1000.0_f32;
        let cutoff = 0.5_f32;
        let ts = 1.0 / loop_hz;
        let op = 1.0 / (PI * ts) * (10.0 * cutoff * PI * ts).tan();
        let oc = op / 0.997_628;
        let expected_b = oc * ts / (2.0 + oc * ts);

        let (_, b) = LowPassFilter::new(0.0, cutoff, loop_hz).coefficients();
        assert_relative_eq!(b, expected_b, max_relative = 1e-4);
    }

    #[test]
    fn test_first_update_holds_constant_input() {
        let mut filter = LowPassFilter::new(42.0, 0.1, 1000.0);
        assert_relative_eq!(filter.update(42.0), 42.0, max_relative = 1e-5);
    }

    #[test]
    fn test_smooths_alternating_input() {
        let mut filter = LowPassFilter::new(0.0, 1.0, 1000.0);
        let mut peak: f32 = 0.0;
        for n in 0..1000 {
            let x = if n % 2 == 0 { 1.0 } else { -1.0 };
            peak = peak.max(filter.update(x).abs());
        }
        // The b + b z^-1 numerator places a zero at Nyquist.
        assert!(peak < 0.02, "alternating input leaked through: {peak}");
    }

    #[test]
    fn test_reinitialize_keeps_coefficients() {
        let mut filter = LowPassFilter::new(0.0, 0.1, 1000.0);
        let coeffs = filter.coefficients();
        for _ in 0..100 {
            filter.update(10.0);
        }
        filter.reinitialize(-3.0);
        assert_eq!(filter.value(), -3.0);
        assert_eq!(filter.coefficients(), coeffs);
        assert_relative_eq!(filter.update(-3.0), -3.0, max_relative = 1e-5);
    }

    #[test]
    fn test_process_buffer_in_place() {
        let mut a = LowPassFilter::new(0.0, 0.5, 100.0);
        let mut b = a;
        let mut buffer = vec![1.0; 32];
        a.process_buffer(&mut buffer);
        for &out in &buffer {
            assert_eq!(out, b.update(1.0));
        }
    }

    #[test]
    fn test_from_config_rejects_degenerate_design() {
        let config = LowPassConfig {
            cutoff_freq_hz: 7.0,
            loop_freq_hz: 100.0,
        };
        assert!(LowPassFilter::from_config(0.0, &config).is_err());
        assert!(LowPassFilter::from_config(0.0, &LowPassConfig::default()).is_ok());
    }
}
