mod measure;
mod noise;
mod signal;

pub use measure::{Cn0Measurement, measure_cn0, nominal_cn0_dbhz};
pub use noise::{
    AdditiveNoiseConfig, DataBitConfig, FadingConfig, FadingType, NoiseConfig, apply_noise,
    generate_noisy_prompt, signal_power,
};
pub use signal::{CarrierConfig, generate_prompt};
