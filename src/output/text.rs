use super::{Formatter, TraceRow};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, row: &TraceRow) -> String {
        let base = format!(
            "[{:>8}] t={:>9.3}s CN0: {:>6.2} dB-Hz (raw: {:>6.2} dB-Hz)",
            row.index, row.time_s, row.smoothed_dbhz, row.raw_dbhz
        );
        if self.verbose {
            format!("{} [I: {:>+10.4}, Q: {:>+10.4}]", base, row.i, row.q)
        } else {
            base
        }
    }
}
