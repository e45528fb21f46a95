use num_complex::Complex32;

use crate::config::TrackingConfig;
use crate::error::Result;
use crate::processing::SmoothedCn0;

/// Summary of running a channel over a block of correlator outputs
#[derive(Debug, Clone, Default)]
pub struct Cn0Measurement {
    /// Mean raw estimate after warm-up, dB-Hz
    pub mean_raw_dbhz: f32,
    /// Smoothed estimate after the last sample, dB-Hz
    pub final_smoothed_dbhz: f32,
    /// Estimates that went into the mean
    pub count: usize,
}

/// Run a fresh [`SmoothedCn0`] over `samples`, skipping the first `settle`
/// outputs when averaging.
pub fn measure_cn0(
    samples: &[Complex32],
    config: &TrackingConfig,
    settle: usize,
) -> Result<Cn0Measurement> {
    let mut channel = SmoothedCn0::new(config)?;
    let mut sum = 0.0_f64;
    let mut count = 0;

    for (n, sample) in samples.iter().enumerate() {
        let reading = channel.update_iq(*sample);
        if n >= settle && reading.raw_dbhz.is_finite() {
            sum += reading.raw_dbhz as f64;
            count += 1;
        }
    }

    Ok(Cn0Measurement {
        mean_raw_dbhz: if count > 0 { (sum / count as f64) as f32 } else { f32::NAN },
        final_smoothed_dbhz: channel.smoothed(),
        count,
    })
}

/// Noise-free SNV estimate for a locked carrier at `snr_db`
///
/// With expectation taken inside the ratio, `P_tot / P_s` is `1 + 1/SNR`,
/// so the estimator saturates at `log_bw` for strong signals.
pub fn nominal_cn0_dbhz(log_bw_db: f32, snr_db: f32) -> f32 {
    let snr = 10.0_f32.powf(snr_db / 10.0);
    log_bw_db - 10.0 * (1.0 + 1.0 / snr).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{CarrierConfig, NoiseConfig, generate_noisy_prompt};

    #[test]
    fn test_clean_signal_measures_log_bw() {
        let config = TrackingConfig::default();
        let samples =
            generate_noisy_prompt(500, 1000.0, &CarrierConfig::default(), &NoiseConfig::default())
                .unwrap();
        let m = measure_cn0(&samples, &config, 1).unwrap();
        assert_eq!(m.count, 499);
        assert!((m.mean_raw_dbhz - config.cn0.log_bw_db()).abs() < 1e-4);
    }

    #[test]
    fn test_nominal_cn0_saturates() {
        assert!((nominal_cn0_dbhz(30.0, 60.0) - 30.0).abs() < 1e-3);
        assert!((nominal_cn0_dbhz(30.0, 0.0) - (30.0 - 10.0 * 2.0_f32.log10())).abs() < 1e-4);
    }
}
