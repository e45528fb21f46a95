mod csv;
mod json;
mod text;

use serde::Serialize;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One traced correlator output and the CN0 it produced
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TraceRow {
    pub index: usize,
    pub time_s: f64,
    pub i: f32,
    pub q: f32,
    pub raw_dbhz: f32,
    pub smoothed_dbhz: f32,
}

pub trait Formatter: Send {
    fn format(&self, row: &TraceRow) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}
