pub mod generate;

pub use generate::{constant_prompt, noisy_prompt, step_series};
