use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use trackdsp::config::Frequency;
use trackdsp::save_iq_wav;
use trackdsp::simulation::{
    AdditiveNoiseConfig, CarrierConfig, NoiseConfig, generate_noisy_prompt,
};

#[derive(Parser, Debug)]
#[command(name = "generate_iq")]
#[command(about = "Generate synthetic prompt correlator outputs as stereo I/Q WAV files")]
struct Args {
    /// TOML carrier and impairment configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Per-sample SNRs in dB: comma-separated (e.g., "-5,0,10") or range (e.g., "-10:30:5")
    #[arg(long, default_value = "-10:30:5", allow_hyphen_values = true)]
    snr: String,

    /// Number of trials per SNR
    #[arg(short, long, default_value_t = 5)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Record duration in seconds
    #[arg(short, long, default_value_t = 10.0)]
    duration: f32,

    /// Integration rate (e.g., "1000", "20ms")
    #[arg(short = 'r', long, default_value = "1000")]
    integration_rate: Frequency,

    /// Correlator output amplitude (CLI override)
    #[arg(long)]
    amplitude: Option<f32>,

    /// Residual carrier frequency in Hz (CLI override)
    #[arg(long)]
    frequency_offset: Option<f32>,

    /// Navigation data bit period in milliseconds, e.g. 20 for GPS L1 C/A
    #[arg(long)]
    data_bit_ms: Option<f32>,

    /// Output filename prefix
    #[arg(long, default_value = "iq")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    carrier: CarrierConfig,
    #[serde(default)]
    noise: NoiseConfig,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    snr_db: f32,
    trial: u32,
    seed: u64,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    integration_freq_hz: f32,
    duration: f32,
    carrier: CarrierConfig,
    files: Vec<ManifestEntry>,
}

const MAX_SNR_POINTS: usize = 10_000;

fn parse_snrs(s: &str) -> Result<Vec<f32>> {
    if s.contains(':') {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            anyhow::bail!("Invalid range format. Use 'start:end:step'");
        }
        let start: f32 = parts[0].trim().parse().context("Invalid start value")?;
        let end: f32 = parts[1].trim().parse().context("Invalid end value")?;
        let step: f32 = parts[2].trim().parse().context("Invalid step value")?;
        if !(step.is_finite() && step > 0.0) {
            anyhow::bail!("Range step must be positive");
        }

        let count = ((end - start) / step).floor();
        if !(count.is_finite() && count < MAX_SNR_POINTS as f32) {
            anyhow::bail!("Range yields more than {} SNR points", MAX_SNR_POINTS);
        }
        Ok((0..=count as i64).map(|n| start + n as f32 * step).collect())
    } else {
        s.split(',')
            .map(|p| p.trim().parse::<f32>().context("Invalid SNR value"))
            .collect()
    }
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_noise_config(toml: &TomlConfig, args: &Args, snr_db: f32, seed: u64) -> NoiseConfig {
    let mut config = toml.noise.clone().with_seed(seed);
    config.additive = Some(AdditiveNoiseConfig { snr_db });

    if let Some(bit_ms) = args.data_bit_ms {
        let samples_per_bit = (bit_ms * args.integration_rate.as_hz() / 1000.0).round() as usize;
        config = config.with_data_bits(samples_per_bit.max(1));
    }

    config
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let mut carrier = toml_config.carrier;
    if let Some(amplitude) = args.amplitude {
        carrier.amplitude = amplitude;
    }
    if let Some(offset) = args.frequency_offset {
        carrier.frequency_offset_hz = offset;
    }

    let integration_freq_hz = args.integration_rate.as_hz();
    if !(integration_freq_hz.is_finite() && integration_freq_hz >= 1.0) {
        anyhow::bail!("Integration rate must be at least 1 Hz");
    }
    let sample_rate = integration_freq_hz.round() as u32;
    if (sample_rate as f32 - integration_freq_hz).abs() > 1e-3 {
        log::warn!(
            "WAV header rate rounded to {} Hz; pass --integration-rate {} when analyzing",
            sample_rate,
            args.integration_rate
        );
    }
    let num_samples = (args.duration * integration_freq_hz).round() as usize;

    let snrs = parse_snrs(&args.snr)?;
    let base_seed = args.seed.unwrap_or(0);

    let mut manifest_entries = Vec::new();
    let total_files = snrs.len() * args.trials as usize;
    let mut file_count = 0;

    for (snr_index, &snr_db) in snrs.iter().enumerate() {
        for trial in 0..args.trials {
            let seed = base_seed + trial as u64 * 1000 + snr_index as u64;
            let noise_config = build_noise_config(&toml_config, &args, snr_db, seed);

            let samples =
                generate_noisy_prompt(num_samples, integration_freq_hz, &carrier, &noise_config)?;

            let filename = format!("{}_snr{:+05.1}_t{:02}.wav", args.prefix, snr_db, trial);
            let filepath = args.output_dir.join(&filename);

            save_iq_wav(&filepath, &samples, sample_rate).context("Failed to write WAV file")?;

            manifest_entries.push(ManifestEntry {
                file: filename,
                snr_db,
                trial,
                seed,
            });

            file_count += 1;
            eprint!("\rGenerating: {}/{}", file_count, total_files);
        }
    }
    eprintln!();

    if args.manifest {
        let manifest = Manifest {
            integration_freq_hz,
            duration: args.duration,
            carrier,
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        total_files,
        args.output_dir.display()
    );
    Ok(())
}
