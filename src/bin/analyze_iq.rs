use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};

use trackdsp::config::{Frequency, TrackingConfig};
use trackdsp::output::{OutputFormat, TraceRow, create_formatter};
use trackdsp::{SmoothedCn0, load_iq_wav};

#[derive(Parser, Debug)]
#[command(name = "analyze_iq")]
#[command(about = "Estimate CN0 from recorded prompt correlator outputs", long_about = None)]
struct Args {
    /// Stereo I/Q WAV files to analyze (left=I, right=Q)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Integration rate (e.g., "1000", "20ms"); overrides the config file and
    /// the WAV sample rate
    #[arg(short = 'r', long)]
    integration_rate: Option<Frequency>,

    /// Swap I and Q channels
    #[arg(short = 's', long)]
    swap_iq: bool,

    /// Print CN0 updates instead of a per-file summary
    #[arg(short = 't', long)]
    trace: bool,

    /// With --trace, print only every Nth update
    #[arg(short = 'e', long, default_value_t = 1)]
    every: usize,

    /// Ignore this many initial outputs in the summary statistics
    #[arg(long, default_value = "0")]
    settle: usize,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f32,
    std_dev: f32,
    min: f32,
    max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct FileAnalysis {
    filename: String,
    integration_freq_hz: f32,
    log_bw_db: f32,
    sample_count: usize,
    raw_cn0: Option<StatsSummary>,
    smoothed_cn0: Option<StatsSummary>,
    final_cn0: Option<f32>,
    non_finite: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match args.config {
        Some(ref path) => TrackingConfig::load(path)?,
        None => TrackingConfig::default(),
    };

    if args.trace {
        if args.every == 0 {
            anyhow::bail!("--every must be at least 1");
        }
        trace_files(&config, &args);
        return Ok(());
    }

    let results: Vec<FileAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &config, &args))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load a recording and build the channel that will process it
fn open_channel(
    path: &Path,
    config: &TrackingConfig,
    args: &Args,
) -> anyhow::Result<(Vec<num_complex::Complex32>, TrackingConfig, SmoothedCn0)> {
    let recording = load_iq_wav(path)?;

    // A config file fixes the rates unless the command line overrides them.
    let rate = match (args.integration_rate, &args.config) {
        (Some(rate), _) => Some(rate),
        (None, Some(_)) => None,
        (None, None) => Some(Frequency::from_hz(recording.sample_rate as f32)),
    };
    let config = match rate {
        Some(rate) => config.with_integration_rate(rate),
        None => *config,
    };
    log::info!(
        "{}: {} outputs at {} Hz",
        path.display(),
        recording.samples.len(),
        config.cn0.integration_freq_hz
    );

    let mut samples = recording.samples;
    if args.swap_iq {
        for s in samples.iter_mut() {
            *s = num_complex::Complex32::new(s.im, s.re);
        }
    }

    let channel = SmoothedCn0::new(&config)?;
    Ok((samples, config, channel))
}

/// Trace every file, reporting failures and moving on; returns how many failed
fn trace_files(config: &TrackingConfig, args: &Args) -> usize {
    let mut failed = 0;
    for path in &args.files {
        if let Err(e) = trace_file(path, config, args) {
            log::error!("{}: {:#}", path.display(), e);
            failed += 1;
        }
    }
    failed
}

fn trace_file(path: &Path, config: &TrackingConfig, args: &Args) -> anyhow::Result<()> {
    let (samples, config, mut channel) = open_channel(path, config, args)?;
    let formatter = create_formatter(args.format, args.verbose > 0);
    let period_s = 1.0 / config.cn0.integration_freq_hz as f64;

    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    for (index, sample) in samples.iter().enumerate() {
        let reading = channel.update_iq(*sample);
        if index % args.every == 0 {
            let row = TraceRow {
                index,
                time_s: index as f64 * period_s,
                i: sample.re,
                q: sample.im,
                raw_dbhz: reading.raw_dbhz,
                smoothed_dbhz: reading.smoothed_dbhz,
            };
            println!("{}", formatter.format(&row));
        }
    }

    Ok(())
}

fn analyze_file(path: &Path, config: &TrackingConfig, args: &Args) -> FileAnalysis {
    match analyze_file_impl(path, config, args) {
        Ok(analysis) => analysis,
        Err(e) => FileAnalysis {
            filename: display_name(path),
            integration_freq_hz: 0.0,
            log_bw_db: 0.0,
            sample_count: 0,
            raw_cn0: None,
            smoothed_cn0: None,
            final_cn0: None,
            non_finite: 0,
            error: Some(e.to_string()),
        },
    }
}

fn analyze_file_impl(
    path: &Path,
    config: &TrackingConfig,
    args: &Args,
) -> anyhow::Result<FileAnalysis> {
    let (samples, config, mut channel) = open_channel(path, config, args)?;

    let mut raw_stats: Stats<f32> = Stats::new();
    let mut smoothed_stats: Stats<f32> = Stats::new();
    let mut non_finite = 0;

    for (index, sample) in samples.iter().enumerate() {
        let reading = channel.update_iq(*sample);
        if index < args.settle {
            continue;
        }
        if reading.raw_dbhz.is_finite() && reading.smoothed_dbhz.is_finite() {
            raw_stats.update(reading.raw_dbhz);
            smoothed_stats.update(reading.smoothed_dbhz);
        } else {
            non_finite += 1;
        }
    }

    if non_finite > 0 {
        log::warn!(
            "{}: {} non-finite CN0 estimates (NaN or infinite I/Q input?)",
            path.display(),
            non_finite
        );
    }

    Ok(FileAnalysis {
        filename: display_name(path),
        integration_freq_hz: config.cn0.integration_freq_hz,
        log_bw_db: channel.log_bw(),
        sample_count: samples.len(),
        raw_cn0: StatsSummary::from_stats(&raw_stats),
        smoothed_cn0: StatsSummary::from_stats(&smoothed_stats),
        final_cn0: (!samples.is_empty()).then(|| channel.smoothed()),
        non_finite,
        error: None,
    })
}

fn print_text(results: &[FileAnalysis]) {
    println!(
        "{:<40} {:>10} {:>10} {:>8} {:>10} {:>10} {:>8}",
        "File", "Rate", "Raw CN0", "Std", "Smoothed", "Final", "Samples"
    );
    println!("{}", "-".repeat(102));

    for result in results {
        if let Some(ref err) = result.error {
            println!("{:<40} ERROR: {}", result.filename, err);
            continue;
        }

        let raw_mean = result
            .raw_cn0
            .as_ref()
            .map(|s| format!("{:.2}", s.mean))
            .unwrap_or_else(|| "-".to_string());
        let raw_std = result
            .raw_cn0
            .as_ref()
            .map(|s| format!("{:.2}", s.std_dev))
            .unwrap_or_else(|| "-".to_string());
        let smoothed_mean = result
            .smoothed_cn0
            .as_ref()
            .map(|s| format!("{:.2}", s.mean))
            .unwrap_or_else(|| "-".to_string());
        let final_cn0 = result
            .final_cn0
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<40} {:>10} {:>10} {:>8} {:>10} {:>10} {:>8}",
            result.filename,
            format!("{:.1}", result.integration_freq_hz),
            raw_mean,
            raw_std,
            smoothed_mean,
            final_cn0,
            result.sample_count
        );
    }

    for result in results {
        if result.error.is_some() {
            continue;
        }
        if let Some(ref raw) = result.raw_cn0 {
            eprintln!();
            eprintln!("Raw CN0 for {}:", result.filename);
            eprintln!("  Ceiling: {:.2} dB-Hz", result.log_bw_db);
            eprintln!("  Min: {:.2} dB-Hz", raw.min);
            eprintln!("  Max: {:.2} dB-Hz", raw.max);
            if result.non_finite > 0 {
                eprintln!("  Non-finite: {}", result.non_finite);
            }
        }
    }
}

fn print_csv(results: &[FileAnalysis]) {
    println!(
        "filename,integration_freq_hz,log_bw_db,raw_mean,raw_std,raw_min,raw_max,smoothed_mean,smoothed_std,final_cn0,sample_count,non_finite,error"
    );
    for result in results {
        let raw_mean = result
            .raw_cn0
            .as_ref()
            .map(|s| format!("{:.3}", s.mean))
            .unwrap_or_default();
        let raw_std = result
            .raw_cn0
            .as_ref()
            .map(|s| format!("{:.3}", s.std_dev))
            .unwrap_or_default();
        let raw_min = result
            .raw_cn0
            .as_ref()
            .map(|s| format!("{:.3}", s.min))
            .unwrap_or_default();
        let raw_max = result
            .raw_cn0
            .as_ref()
            .map(|s| format!("{:.3}", s.max))
            .unwrap_or_default();
        let smoothed_mean = result
            .smoothed_cn0
            .as_ref()
            .map(|s| format!("{:.3}", s.mean))
            .unwrap_or_default();
        let smoothed_std = result
            .smoothed_cn0
            .as_ref()
            .map(|s| format!("{:.3}", s.std_dev))
            .unwrap_or_default();
        let final_cn0 = result
            .final_cn0
            .map(|v| format!("{:.3}", v))
            .unwrap_or_default();
        let error = result.error.as_deref().unwrap_or("");

        println!(
            "{},{},{:.3},{},{},{},{},{},{},{},{},{},{}",
            result.filename,
            result.integration_freq_hz,
            result.log_bw_db,
            raw_mean,
            raw_std,
            raw_min,
            raw_max,
            smoothed_mean,
            smoothed_std,
            final_cn0,
            result.sample_count,
            result.non_finite,
            error
        );
    }
}

fn print_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
