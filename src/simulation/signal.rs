use std::f32::consts::PI;

use num_complex::Complex32;

/// Residual carrier seen by the prompt correlator
///
/// With zero phase and frequency offsets the loop is perfectly locked and
/// all signal energy lands in the in-phase arm.
#[derive(Clone, Copy, Debug, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CarrierConfig {
    /// Correlator output amplitude
    pub amplitude: f32,
    /// Static carrier phase error in radians
    pub phase_offset_rad: f32,
    /// Residual carrier frequency in Hz
    pub frequency_offset_hz: f32,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            phase_offset_rad: 0.0,
            frequency_offset_hz: 0.0,
        }
    }
}

/// Generate noiseless prompt correlator outputs, one per integration period
pub fn generate_prompt(
    num_samples: usize,
    integration_freq_hz: f32,
    carrier: &CarrierConfig,
) -> Vec<Complex32> {
    let phase_step = 2.0 * PI * carrier.frequency_offset_hz / integration_freq_hz;

    (0..num_samples)
        .map(|n| {
            let phase = (carrier.phase_offset_rad + phase_step * n as f32) % (2.0 * PI);
            Complex32::from_polar(carrier.amplitude, phase)
        })
        .collect()
}
