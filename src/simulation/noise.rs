use num_complex::Complex32;
use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f32::consts::PI;

use crate::error::{Result, TrackError};

use super::signal::{CarrierConfig, generate_prompt};

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub fading: Option<FadingConfig>,
    pub data_bits: Option<DataBitConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_fading(mut self, fading_type: FadingType, doppler_spread_hz: f32) -> Self {
        self.fading = Some(FadingConfig {
            fading_type,
            doppler_spread_hz,
        });
        self
    }

    pub fn with_data_bits(mut self, samples_per_bit: usize) -> Self {
        self.data_bits = Some(DataBitConfig { samples_per_bit });
        self
    }
}

/// Complex white Gaussian noise
///
/// `snr_db` is the per-sample ratio of signal power to total noise power
/// across both arms.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub snr_db: f32,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FadingType {
    Rayleigh,
    Rician { k_factor: f32 },
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct FadingConfig {
    #[serde(flatten)]
    pub fading_type: FadingType,
    pub doppler_spread_hz: f32,
}

/// Navigation data modulation: random sign per bit
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DataBitConfig {
    pub samples_per_bit: usize,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

fn normal(std_dev: f32) -> Result<Normal<f64>> {
    Normal::new(0.0, std_dev as f64).map_err(|e| TrackError::Config(format!("noise: {e}")))
}

/// Mean power of complex samples
pub fn signal_power(signal: &[Complex32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|s| s.norm_sqr()).sum::<f32>() / signal.len() as f32
}

fn apply_data_bits(signal: &mut [Complex32], config: &DataBitConfig, rng: &mut ChaCha8Rng) {
    if config.samples_per_bit == 0 {
        return;
    }

    for bit in signal.chunks_mut(config.samples_per_bit) {
        if rng.random::<bool>() {
            for sample in bit.iter_mut() {
                *sample = -*sample;
            }
        }
    }
}

/// Multiply by a complex fading gain (sum-of-sinusoids Jakes model)
fn apply_fading(
    signal: &mut [Complex32],
    config: &FadingConfig,
    integration_freq_hz: f32,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    let n = signal.len();
    if n == 0 {
        return Ok(());
    }

    let fd = config.doppler_spread_hz;
    let mut scatter = vec![Complex32::new(0.0, 0.0); n];

    if fd > 0.0 {
        let num_sinusoids = 16;
        for _ in 0..num_sinusoids {
            let theta: f32 = rng.random::<f32>() * 2.0 * PI;
            let freq = fd * theta.cos();
            let phi: f32 = rng.random::<f32>() * 2.0 * PI;

            for (i, s) in scatter.iter_mut().enumerate() {
                let t = i as f32 / integration_freq_hz;
                *s += Complex32::from_polar(1.0, 2.0 * PI * freq * t + phi);
            }
        }

        let scale = 1.0 / (num_sinusoids as f32).sqrt();
        for s in scatter.iter_mut() {
            *s *= scale;
        }
    } else {
        // Block fading: one complex gain for the whole record.
        let normal = normal(std::f32::consts::FRAC_1_SQRT_2)?;
        let gain = Complex32::new(normal.sample(rng) as f32, normal.sample(rng) as f32);
        scatter.fill(gain);
    }

    let (los, scatter_amplitude) = match config.fading_type {
        FadingType::Rayleigh => (0.0, 1.0),
        FadingType::Rician { k_factor } => {
            ((k_factor / (k_factor + 1.0)).sqrt(), (1.0 / (k_factor + 1.0)).sqrt())
        }
    };

    for (sample, s) in signal.iter_mut().zip(scatter.iter()) {
        *sample *= Complex32::new(los, 0.0) + *s * scatter_amplitude;
    }

    Ok(())
}

/// Add noise whose power is `reference_power` scaled down by the SNR
fn apply_additive_noise(
    signal: &mut [Complex32],
    reference_power: f32,
    config: &AdditiveNoiseConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    if reference_power == 0.0 {
        return Ok(());
    }

    let snr_linear = 10.0_f32.powf(config.snr_db / 10.0);
    let noise_power = reference_power / snr_linear;
    let arm_std = (noise_power / 2.0).sqrt();

    let normal = normal(arm_std)?;

    for sample in signal.iter_mut() {
        sample.re += normal.sample(rng) as f32;
        sample.im += normal.sample(rng) as f32;
    }

    Ok(())
}

/// Apply impairments to clean correlator outputs
///
/// Order: data bits, fading, then additive noise.
pub fn apply_noise(
    clean_signal: &[Complex32],
    config: &NoiseConfig,
    integration_freq_hz: f32,
) -> Result<Vec<Complex32>> {
    let mut signal = clean_signal.to_vec();
    let mut rng = create_rng(config.seed);

    if let Some(ref bit_config) = config.data_bits {
        apply_data_bits(&mut signal, bit_config, &mut rng);
    }

    if let Some(ref fading_config) = config.fading {
        apply_fading(&mut signal, fading_config, integration_freq_hz, &mut rng)?;
    }

    // The noise floor is tied to the unfaded signal power.
    if let Some(ref additive_config) = config.additive {
        let reference_power = signal_power(clean_signal);
        apply_additive_noise(&mut signal, reference_power, additive_config, &mut rng)?;
    }

    Ok(signal)
}

/// Generate impaired prompt correlator outputs
pub fn generate_noisy_prompt(
    num_samples: usize,
    integration_freq_hz: f32,
    carrier: &CarrierConfig,
    noise_config: &NoiseConfig,
) -> Result<Vec<Complex32>> {
    let clean = generate_prompt(num_samples, integration_freq_hz, carrier);
    apply_noise(&clean, noise_config, integration_freq_hz)
}
