use super::{Formatter, TraceRow};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, row: &TraceRow) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{:.3},{:.3}",
            row.index, row.time_s, row.i, row.q, row.raw_dbhz, row.smoothed_dbhz
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("index,time_s,i,q,raw_dbhz,smoothed_dbhz")
    }
}
