use num_complex::Complex32;

use crate::config::Cn0EstimatorConfig;
use crate::constants::{CN0_SNV_NSR_MAX, CN0_SNV_NSR_MIN_MULTIPLIER};
use crate::error::Result;

/// Magnitudes retained from the previous correlator output.
#[derive(Debug, Clone, Copy, PartialEq)]
enum History {
    /// No sample seen since initialization; one is needed before estimating.
    WarmingUp,
    Steady { i_abs: f32, q_abs: f32 },
}

/// Carrier-to-noise density estimator (signal-to-noise variance method)
///
/// Estimates \\(C/N_0\\) from consecutive prompt correlator outputs:
///
/// - signal power \\(P_s = (\tfrac12(|I_n| + |I_{n-1}|))^2\\)
/// - total power \\(P_{tot} = \tfrac12(I_{n-1}^2 + Q_{n-1}^2 + I_n^2 + Q_n^2)\\)
/// - \\(C/N_0 = 10\log_{10}(B \cdot f_i / f_s) - 10\log_{10}(P_{tot}/P_s)\\)
///
/// The estimate assumes the carrier is phase locked so that the signal sits
/// in the in-phase arm. The noise-to-signal ratio is capped at
/// [`CN0_SNV_NSR_MAX`], which bounds every output after warm-up to
/// `[log_bw - 60, log_bw]` dB-Hz.
///
/// All arithmetic is single precision and follows a fixed evaluation order,
/// so identical inputs reproduce identical outputs bit for bit. Magnitudes
/// whose squares overflow or underflow f32 are normalised to the largest of
/// the four before the ratio is taken, so any finite input gives a finite
/// estimate.
#[derive(Debug, Clone, Copy)]
pub struct Cn0Estimator {
    log_bw: f32,
    history: History,
    cn0: f32,
}

impl Cn0Estimator {
    /// Create an estimator
    ///
    /// # Arguments
    /// * `noise_bandwidth_hz` - Loop noise bandwidth in Hz
    /// * `initial_cn0_dbhz` - Value reported until two samples have been seen
    /// * `sample_freq_hz` - Input sampling frequency in Hz
    /// * `integration_freq_hz` - Loop integration frequency in Hz
    ///
    /// No validation is performed: a bandwidth ratio that is zero, negative
    /// or non-finite yields a non-finite `log_bw` that poisons every later
    /// estimate. Use [`Cn0Estimator::from_config`] to reject such inputs.
    pub fn new(
        noise_bandwidth_hz: f32,
        initial_cn0_dbhz: f32,
        sample_freq_hz: f32,
        integration_freq_hz: f32,
    ) -> Self {
        Self {
            log_bw: Self::bandwidth_term_db(noise_bandwidth_hz, sample_freq_hz, integration_freq_hz),
            history: History::WarmingUp,
            cn0: initial_cn0_dbhz,
        }
    }

    /// `10·log10(bw · f_i / f_s)` in dB
    pub(crate) fn bandwidth_term_db(
        noise_bandwidth_hz: f32,
        sample_freq_hz: f32,
        integration_freq_hz: f32,
    ) -> f32 {
        10.0 * (noise_bandwidth_hz * integration_freq_hz / sample_freq_hz).log10()
    }

    /// Create an estimator from validated configuration
    pub fn from_config(config: &Cn0EstimatorConfig) -> Result<Self> {
        config.validate()?;

        let estimator = Self::new(
            config.noise_bandwidth_hz,
            config.initial_cn0_dbhz,
            config.sample_freq_hz,
            config.integration_freq_hz,
        );
        log::debug!(
            "CN0 estimator: log_bw {:.3} dB, initial {:.1} dB-Hz",
            estimator.log_bw,
            estimator.cn0
        );

        Ok(estimator)
    }

    /// Feed one correlator output and return the updated CN0 in dB-Hz
    ///
    /// The first call after initialization only records the sample and
    /// returns the initial CN0 unchanged.
    pub fn update(&mut self, i: f32, q: f32) -> f32 {
        let i_abs = i.abs();
        let q_abs = q.abs();
        let previous = std::mem::replace(&mut self.history, History::Steady { i_abs, q_abs });

        if let History::Steady {
            i_abs: i_prev_abs,
            q_abs: q_prev_abs,
        } = previous
        {
            let mags = [i_prev_abs, q_prev_abs, i_abs, q_abs];
            let (mut p_s, mut p_tot) = snv_powers(mags);

            // Squares overflowed or underflowed; the ratio is scale free, so
            // redo it on magnitudes normalised to the largest one.
            if !p_tot.is_finite() || p_tot < f32::MIN_POSITIVE {
                let peak = mags.iter().fold(0.0_f32, |m, &x| m.max(x));
                if peak.is_finite() && peak > 0.0 {
                    (p_s, p_tot) = snv_powers(mags.map(|x| x / peak));
                }
            }
            let p_n = p_tot - p_s;

            // Zero total power leaves nothing to estimate; report the floor.
            let nsr = if p_s < p_n * CN0_SNV_NSR_MIN_MULTIPLIER || p_tot == 0.0 {
                CN0_SNV_NSR_MAX
            } else {
                p_tot / p_s
            };

            self.cn0 = self.log_bw - 10.0 * nsr.log10();
        }

        self.cn0
    }

    /// Feed one correlator output given as a complex sample (`re` = I, `im` = Q)
    pub fn update_iq(&mut self, sample: Complex32) -> f32 {
        self.update(sample.re, sample.im)
    }

    /// Run a block of correlator outputs, writing one estimate per sample
    ///
    /// Processes as many samples as the shorter of the two slices holds.
    pub fn process_buffer(&mut self, samples: &[Complex32], estimates: &mut [f32]) {
        for (sample, estimate) in samples.iter().zip(estimates.iter_mut()) {
            *estimate = self.update_iq(*sample);
        }
    }

    /// Return to the warm-up state with a new initial CN0
    ///
    /// The bandwidth term is kept; the next update only records its sample.
    pub fn reinitialize(&mut self, initial_cn0_dbhz: f32) {
        self.history = History::WarmingUp;
        self.cn0 = initial_cn0_dbhz;
    }

    /// Current CN0 estimate in dB-Hz
    pub fn cn0(&self) -> f32 {
        self.cn0
    }

    /// Bandwidth term `10·log10(bw · f_i / f_s)` in dB
    pub fn log_bw(&self) -> f32 {
        self.log_bw
    }

    pub fn is_warming_up(&self) -> bool {
        self.history == History::WarmingUp
    }
}

/// Signal and total power from `[|I_prev|, |Q_prev|, |I|, |Q|]`
fn snv_powers([i_prev_abs, q_prev_abs, i_abs, q_abs]: [f32; 4]) -> (f32, f32) {
    let mut p_s = 0.5 * (i_abs + i_prev_abs);
    p_s *= p_s;
    let p_tot = 0.5
        * (q_prev_abs * q_prev_abs + i_prev_abs * i_prev_abs + q_abs * q_abs + i_abs * i_abs);
    (p_s, p_tot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> Cn0Estimator {
        Cn0Estimator::new(1.0, 40.0, 1000.0, 1.0)
    }

    #[test]
    fn test_log_bw() {
        let est = estimator();
        assert!((est.log_bw() + 30.0).abs() < 1e-5);
        assert_eq!(est.cn0(), 40.0);
        assert!(est.is_warming_up());
    }

    #[test]
    fn test_first_update_returns_initial_value() {
        for (i, q) in [(1.0, 0.0), (-3.5, 2.0), (0.0, 0.0), (1e6, -1e-6)] {
            let mut est = estimator();
            assert_eq!(est.update(i, q), 40.0);
            assert!(!est.is_warming_up());
        }
    }

    #[test]
    fn test_equal_in_phase_samples_give_log_bw() {
        let mut est = estimator();
        est.update(1.0, 0.0);
        assert_eq!(est.update(1.0, 0.0), est.log_bw());
    }

    #[test]
    fn test_sign_of_samples_is_ignored() {
        let mut a = estimator();
        let mut b = estimator();
        a.update(0.8, 0.1);
        b.update(-0.8, -0.1);
        assert_eq!(a.update(0.9, -0.2), b.update(-0.9, 0.2));
    }

    #[test]
    fn test_nsr_clamped_when_signal_vanishes() {
        // No in-phase energy at all: P_s = 0 while P_n > 0.
        for q in [1e-3, 1.0, 1e3] {
            let mut est = estimator();
            est.update(0.0, q);
            let cn0 = est.update(0.0, q);
            assert_eq!(cn0, est.log_bw() - 10.0 * CN0_SNV_NSR_MAX.log10());
        }
    }

    #[test]
    fn test_zero_power_is_finite() {
        let mut est = estimator();
        est.update(0.0, 0.0);
        let cn0 = est.update(0.0, 0.0);
        assert!(cn0.is_finite());
        assert_eq!(cn0, est.log_bw() - 10.0 * CN0_SNV_NSR_MAX.log10());
    }

    #[test]
    fn test_huge_magnitudes_stay_finite() {
        let mut est = estimator();
        est.update(1e20, 0.0);
        assert_eq!(est.update(1e20, 0.0), est.log_bw());

        let cn0 = est.update(f32::MAX, 3e38);
        assert!(cn0.is_finite());
        assert!(cn0 <= est.log_bw() && cn0 >= est.log_bw() - 10.0 * CN0_SNV_NSR_MAX.log10());
    }

    #[test]
    fn test_tiny_magnitudes_keep_clean_reading() {
        let mut est = estimator();
        est.update(1e-30, 0.0);
        assert_eq!(est.update(1e-30, 0.0), est.log_bw());

        let mut est = estimator();
        est.update(0.0, 1e-30);
        assert_eq!(
            est.update(0.0, 1e-30),
            est.log_bw() - 10.0 * CN0_SNV_NSR_MAX.log10()
        );
    }

    #[test]
    fn test_scale_does_not_change_estimate() {
        let mut reference = estimator();
        reference.update(0.8, 0.1);
        let expected = reference.update(0.9, -0.2);

        for scale in [1e-25_f32, 1e25] {
            let mut est = estimator();
            est.update(0.8 * scale, 0.1 * scale);
            let cn0 = est.update(0.9 * scale, -0.2 * scale);
            assert!((cn0 - expected).abs() < 1e-4, "scale {scale}: {cn0} vs {expected}");
        }
    }

    #[test]
    fn test_non_finite_input_propagates() {
        let mut est = estimator();
        est.update(1.0, 0.0);
        assert!(est.update(f32::NAN, 0.0).is_nan());
    }

    #[test]
    fn test_invalid_bandwidth_poisons_output() {
        let mut est = Cn0Estimator::new(0.0, 40.0, 1000.0, 1.0);
        assert_eq!(est.update(1.0, 0.0), 40.0);
        assert!(!est.update(1.0, 0.0).is_finite());
    }

    #[test]
    fn test_reinitialize_restarts_warm_up() {
        let mut est = estimator();
        est.update(1.0, 0.0);
        est.update(0.5, 0.5);
        est.reinitialize(35.0);
        assert!(est.is_warming_up());
        assert_eq!(est.update(0.0, 1.0), 35.0);
        assert!((est.log_bw() + 30.0).abs() < 1e-5);
    }

    #[test]
    fn test_process_buffer_matches_update() {
        let samples: Vec<Complex32> = (0..16)
            .map(|n| Complex32::new(1.0 + 0.1 * (n as f32).sin(), 0.05 * (n as f32).cos()))
            .collect();

        let mut single = estimator();
        let expected: Vec<f32> = samples.iter().map(|s| single.update(s.re, s.im)).collect();

        let mut batch = estimator();
        let mut estimates = vec![0.0; samples.len()];
        batch.process_buffer(&samples, &mut estimates);

        assert_eq!(estimates, expected);
    }

    #[test]
    fn test_from_config_rejects_bad_rates() {
        let config = Cn0EstimatorConfig {
            integration_freq_hz: f32::NAN,
            ..Default::default()
        };
        assert!(Cn0Estimator::from_config(&config).is_err());

        let est = Cn0Estimator::from_config(&Cn0EstimatorConfig::default()).unwrap();
        assert!((est.log_bw() - 30.0).abs() < 1e-5);
    }
}
