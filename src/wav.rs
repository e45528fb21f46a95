use std::path::Path;

use hound::{WavReader, WavSpec, WavWriter};
use num_complex::Complex32;

use crate::error::{Result, TrackError};

/// Correlator outputs loaded from a stereo WAV file
///
/// Left channel carries I, right channel carries Q; one frame per
/// integration period, so the WAV sample rate is the integration rate.
#[derive(Debug, Clone)]
pub struct IqRecording {
    pub samples: Vec<Complex32>,
    pub sample_rate: u32,
}

pub fn save_iq_wav<P: AsRef<Path>>(path: P, samples: &[Complex32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for sample in samples {
        writer.write_sample(sample.re)?;
        writer.write_sample(sample.im)?;
    }

    writer.finalize()?;
    Ok(())
}

pub fn load_iq_wav<P: AsRef<Path>>(path: P) -> Result<IqRecording> {
    let mut reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    if spec.channels != 2 {
        return Err(TrackError::Config(format!(
            "Expected stereo I/Q WAV file, got {} channels",
            spec.channels
        )));
    }

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let samples = interleaved
        .chunks_exact(2)
        .map(|frame| Complex32::new(frame[0], frame[1]))
        .collect();

    Ok(IqRecording {
        samples,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iq_channels_preserved() {
        let path = std::env::temp_dir().join(format!("trackdsp_iq_{}.wav", std::process::id()));
        let samples = vec![
            Complex32::new(0.5, -0.25),
            Complex32::new(-1.0, 0.0),
            Complex32::new(0.0, 0.75),
        ];

        save_iq_wav(&path, &samples, 1000).unwrap();
        let recording = load_iq_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(recording.sample_rate, 1000);
        assert_eq!(recording.samples, samples);
    }

    #[test]
    fn test_rejects_mono() {
        let path = std::env::temp_dir().join(format!("trackdsp_mono_{}.wav", std::process::id()));
        let spec = WavSpec {
            channels: 1,
            sample_rate: 1000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0_i16).unwrap();
        writer.finalize().unwrap();

        let result = load_iq_wav(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(TrackError::Config(_))));
    }
}
