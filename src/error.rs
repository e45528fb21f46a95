use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("Degenerate low-pass design: cutoff {cutoff_hz} Hz at loop rate {loop_hz} Hz")]
    DegenerateFilter { cutoff_hz: f32, loop_hz: f32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, TrackError>;
