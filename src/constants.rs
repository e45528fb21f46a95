//! Numeric constants for the tracking kernels
//!
//! These values are part of the numeric contract of the estimator and the
//! loop filter; changing any of them changes every output bit.

/// Multiplier for detecting an out-of-bounds noise-to-signal ratio.
/// When signal power falls below noise power times this factor the NSR is
/// clamped to [`CN0_SNV_NSR_MAX`].
pub const CN0_SNV_NSR_MIN_MULTIPLIER: f32 = 1e-6;

/// Largest NSR the SNV estimator reports (reciprocal of the multiplier).
pub const CN0_SNV_NSR_MAX: f32 = 1e6;

/// Scale applied to the cutoff frequency before the tangent pre-warp.
pub const LP_CUTOFF_PREWARP_SCALE: f32 = 10.0;

/// Passband attenuation of the analog prototype at the pre-warped corner, in dB.
pub const LP_PASSBAND_ATTENUATION_DB: f32 = 3.0;
