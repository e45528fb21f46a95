pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod processing;
pub mod signal_processing;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::{Frequency, TrackingConfig};
pub use error::{Result, TrackError};
pub use processing::{Cn0Reading, SmoothedCn0};
pub use signal_processing::{Cn0Estimator, LowPassFilter};
pub use wav::{IqRecording, load_iq_wav, save_iq_wav};
