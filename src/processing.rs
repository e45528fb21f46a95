use num_complex::Complex32;

use crate::config::TrackingConfig;
use crate::error::Result;
use crate::signal_processing::{Cn0Estimator, LowPassFilter};

/// One CN0 update: the raw estimate and its smoothed value, both in dB-Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cn0Reading {
    pub raw_dbhz: f32,
    pub smoothed_dbhz: f32,
}

/// CN0 estimator paired with a loop low-pass filter
///
/// Owned by a single tracking channel. Every correlator output advances
/// both stages once, so the filter's loop rate should equal the estimator's
/// integration rate.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedCn0 {
    estimator: Cn0Estimator,
    filter: LowPassFilter,
    initial_cn0_dbhz: f32,
}

impl SmoothedCn0 {
    pub fn new(config: &TrackingConfig) -> Result<Self> {
        let initial = config.cn0.initial_cn0_dbhz;
        let estimator = Cn0Estimator::from_config(&config.cn0)?;
        let filter = LowPassFilter::from_config(initial, &config.filter)?;

        if config.filter.loop_freq_hz != config.cn0.integration_freq_hz {
            log::warn!(
                "CN0 filter loop rate {} Hz differs from integration rate {} Hz",
                config.filter.loop_freq_hz,
                config.cn0.integration_freq_hz
            );
        }

        Ok(Self {
            estimator,
            filter,
            initial_cn0_dbhz: initial,
        })
    }

    /// Feed one correlator output
    ///
    /// During warm-up the estimator reports the initial CN0, which the filter
    /// was settled at, so the smoothed value holds still.
    pub fn update(&mut self, i: f32, q: f32) -> Cn0Reading {
        let raw_dbhz = self.estimator.update(i, q);
        let smoothed_dbhz = self.filter.update(raw_dbhz);
        Cn0Reading {
            raw_dbhz,
            smoothed_dbhz,
        }
    }

    pub fn update_iq(&mut self, sample: Complex32) -> Cn0Reading {
        self.update(sample.re, sample.im)
    }

    /// Latest unfiltered estimate in dB-Hz
    pub fn raw(&self) -> f32 {
        self.estimator.cn0()
    }

    /// Latest smoothed estimate in dB-Hz
    pub fn smoothed(&self) -> f32 {
        self.filter.value()
    }

    pub fn log_bw(&self) -> f32 {
        self.estimator.log_bw()
    }

    pub fn is_warming_up(&self) -> bool {
        self.estimator.is_warming_up()
    }

    /// Restart both stages at the configured initial CN0, e.g. after loss of lock
    pub fn reinitialize(&mut self) {
        self.estimator.reinitialize(self.initial_cn0_dbhz);
        self.filter.reinitialize(self.initial_cn0_dbhz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Cn0EstimatorConfig, LowPassConfig};

    #[test]
    fn test_warm_up_holds_initial_value() {
        let mut channel = SmoothedCn0::new(&TrackingConfig::default()).unwrap();
        let reading = channel.update(0.3, 0.4);
        assert_eq!(reading.raw_dbhz, 40.0);
        assert!((reading.smoothed_dbhz - 40.0).abs() < 1e-3);
        assert!(!channel.is_warming_up());
    }

    #[test]
    fn test_smoothed_tracks_raw_slowly() {
        let mut channel = SmoothedCn0::new(&TrackingConfig::default()).unwrap();
        // Clean in-phase signal: raw jumps to log_bw (30 dB) after warm-up.
        let mut last = channel.update(1.0, 0.0);
        for _ in 0..100 {
            let reading = channel.update(1.0, 0.0);
            assert_eq!(reading.raw_dbhz, channel.log_bw());
            assert!(reading.smoothed_dbhz <= last.smoothed_dbhz + 1e-4);
            last = reading;
        }
        assert!(last.smoothed_dbhz > 30.0 && last.smoothed_dbhz < 40.0);
    }

    #[test]
    fn test_reinitialize() {
        let mut channel = SmoothedCn0::new(&TrackingConfig::default()).unwrap();
        for _ in 0..50 {
            channel.update(1.0, 0.0);
        }
        channel.reinitialize();
        assert!(channel.is_warming_up());
        assert_eq!(channel.raw(), 40.0);
        assert_eq!(channel.smoothed(), 40.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TrackingConfig {
            cn0: Cn0EstimatorConfig {
                sample_freq_hz: -1.0,
                ..Default::default()
            },
            filter: LowPassConfig::default(),
        };
        assert!(SmoothedCn0::new(&config).is_err());
    }
}
