use num_complex::Complex32;
use trackdsp::simulation::{CarrierConfig, NoiseConfig, generate_noisy_prompt};

/// Locked carrier with no noise: every output is `(amplitude, 0)`
#[allow(dead_code)]
pub fn constant_prompt(num_samples: usize, amplitude: f32) -> Vec<Complex32> {
    vec![Complex32::new(amplitude, 0.0); num_samples]
}

/// Locked unit carrier with seeded complex white noise at `snr_db` per sample
#[allow(dead_code)]
pub fn noisy_prompt(num_samples: usize, snr_db: f32, seed: u64) -> Vec<Complex32> {
    let noise = NoiseConfig::default().with_seed(seed).with_awgn(snr_db);
    generate_noisy_prompt(num_samples, 1000.0, &CarrierConfig::default(), &noise)
        .expect("valid noise configuration")
}

/// `before` for `step_at` samples, then `after`
#[allow(dead_code)]
pub fn step_series(num_samples: usize, step_at: usize, before: f32, after: f32) -> Vec<f32> {
    (0..num_samples)
        .map(|n| if n < step_at { before } else { after })
        .collect()
}
