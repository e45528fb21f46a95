//! Configuration for the carrier-tracking kernels.
//!
//! Parameters can be built in code, loaded from TOML, or left at their
//! defaults (1 ms GPS L1 C/A integration). Every table and field is optional
//! in TOML; missing values fall back to [`Default`].
//!
//! ```toml
//! [cn0]
//! noise_bandwidth_hz = 1000.0
//! initial_cn0_dbhz = 40.0
//! sample_freq_hz = 1000.0
//! integration_freq_hz = 1000.0
//!
//! [filter]
//! cutoff_freq_hz = 0.1
//! loop_freq_hz = 1000.0
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::signal_processing::{Cn0Estimator, LowPassFilter};

/// Rate specification for loop and integration frequencies
///
/// Can be specified as either a frequency or an integration period. Tracking
/// loops are usually described by their coherent integration time, so
/// `"20ms"` is as natural as `"50hz"`.
///
/// # Parsing formats
/// - `1000` - frequency in Hz (no suffix)
/// - `1000hz` or `1000Hz` - frequency in Hz (explicit)
/// - `1khz` or `1kHz` - frequency in kHz
/// - `20ms` - period in milliseconds
/// - `500us` or `500μs` - period in microseconds
///
/// # Example
/// ```
/// use trackdsp::config::Frequency;
///
/// let rate: Frequency = "20ms".parse().unwrap();
/// assert!((rate.as_hz() - 50.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frequency(f32);

impl Frequency {
    /// Create from frequency in Hz
    pub fn from_hz(hz: f32) -> Self {
        Self(hz)
    }

    /// Create from period in milliseconds
    pub fn from_period_ms(ms: f32) -> Self {
        Self(1_000.0 / ms)
    }

    /// Create from period in microseconds
    pub fn from_interval_us(us: f32) -> Self {
        Self(1_000_000.0 / us)
    }

    /// Get frequency in Hz
    pub fn as_hz(&self) -> f32 {
        self.0
    }

    /// Get period in milliseconds
    pub fn as_period_ms(&self) -> f32 {
        1_000.0 / self.0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}hz", self.0)
    }
}

fn parse_positive(num: &str, input: &str, what: &str) -> std::result::Result<f32, String> {
    let value: f32 = num
        .trim()
        .parse()
        .map_err(|_| format!("invalid {}: {}", what, input))?;
    if !(value.is_finite() && value > 0.0) {
        return Err(format!("{} must be positive", what));
    }
    Ok(value)
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_lowercase();

        if let Some(num) = lower.strip_suffix("ms") {
            return Ok(Self::from_period_ms(parse_positive(num, s, "period")?));
        }

        if let Some(num) = lower.strip_suffix("us").or_else(|| lower.strip_suffix("μs")) {
            return Ok(Self::from_interval_us(parse_positive(num, s, "interval")?));
        }

        if let Some(num) = lower.strip_suffix("khz") {
            return Ok(Self::from_hz(parse_positive(num, s, "frequency")? * 1_000.0));
        }

        let num = lower.strip_suffix("hz").unwrap_or(&lower);
        Ok(Self::from_hz(parse_positive(num, s, "frequency")?))
    }
}

/// CN0 estimator parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cn0EstimatorConfig {
    /// Loop noise bandwidth in Hz
    pub noise_bandwidth_hz: f32,
    /// CN0 reported until the estimator has two samples, in dB-Hz
    pub initial_cn0_dbhz: f32,
    /// Input sampling frequency in Hz
    pub sample_freq_hz: f32,
    /// Loop integration frequency in Hz (correlator outputs per second)
    pub integration_freq_hz: f32,
}

impl Cn0EstimatorConfig {
    /// Bandwidth term of the CN0 formula, `10·log10(bw · f_i / f_s)`, in dB.
    pub fn log_bw_db(&self) -> f32 {
        Cn0Estimator::bandwidth_term_db(
            self.noise_bandwidth_hz,
            self.sample_freq_hz,
            self.integration_freq_hz,
        )
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("noise_bandwidth_hz", self.noise_bandwidth_hz)?;
        require_positive("sample_freq_hz", self.sample_freq_hz)?;
        require_positive("integration_freq_hz", self.integration_freq_hz)?;

        if !self.initial_cn0_dbhz.is_finite() {
            return Err(TrackError::InvalidParameter {
                name: "initial_cn0_dbhz",
                value: self.initial_cn0_dbhz,
                reason: "must be finite",
            });
        }

        let ratio = self.noise_bandwidth_hz * self.integration_freq_hz / self.sample_freq_hz;
        if !self.log_bw_db().is_finite() {
            return Err(TrackError::InvalidParameter {
                name: "noise_bandwidth_hz * integration_freq_hz / sample_freq_hz",
                value: ratio,
                reason: "bandwidth ratio has no finite logarithm",
            });
        }

        Ok(())
    }
}

impl Default for Cn0EstimatorConfig {
    fn default() -> Self {
        Self {
            noise_bandwidth_hz: 1000.0,
            initial_cn0_dbhz: 40.0,
            sample_freq_hz: 1000.0,
            integration_freq_hz: 1000.0,
        }
    }
}

/// Loop low-pass filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowPassConfig {
    /// Filter cut-off frequency in Hz
    pub cutoff_freq_hz: f32,
    /// Rate at which the filter is updated, in Hz
    pub loop_freq_hz: f32,
}

impl LowPassConfig {
    /// Checks that the parameters are positive and that the derived
    /// recursion has finite coefficients with its pole inside the unit
    /// circle.
    ///
    /// The cutoff is scaled by ten before the tangent pre-warp, so designs
    /// stop being usable once `cutoff_freq_hz` approaches `loop_freq_hz / 20`.
    pub fn validate(&self) -> Result<()> {
        require_positive("cutoff_freq_hz", self.cutoff_freq_hz)?;
        require_positive("loop_freq_hz", self.loop_freq_hz)?;

        let (a, b) = LowPassFilter::design(self.cutoff_freq_hz, self.loop_freq_hz);
        if !a.is_finite() || !b.is_finite() || a.abs() >= 1.0 {
            return Err(TrackError::DegenerateFilter {
                cutoff_hz: self.cutoff_freq_hz,
                loop_hz: self.loop_freq_hz,
            });
        }

        Ok(())
    }
}

impl Default for LowPassConfig {
    fn default() -> Self {
        Self {
            cutoff_freq_hz: 0.1,
            loop_freq_hz: 1000.0,
        }
    }
}

/// Complete parameter set for one smoothed CN0 channel
///
/// # Example
/// ```
/// use trackdsp::config::TrackingConfig;
///
/// let config = TrackingConfig::from_toml_str("[cn0]\ninitial_cn0_dbhz = 35.0\n").unwrap();
/// assert_eq!(config.cn0.initial_cn0_dbhz, 35.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// CN0 estimator configuration
    pub cn0: Cn0EstimatorConfig,
    /// Smoothing filter configuration
    pub filter: LowPassConfig,
}

impl TrackingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TrackError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Sets the integration rate and keeps the filter running once per
    /// correlator output.
    pub fn with_integration_rate(mut self, rate: Frequency) -> Self {
        self.cn0.integration_freq_hz = rate.as_hz();
        self.filter.loop_freq_hz = rate.as_hz();
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.cn0.validate()?;
        self.filter.validate()
    }
}

fn require_positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TrackError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive",
        })
    }
}
