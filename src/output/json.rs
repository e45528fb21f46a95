use super::{Formatter, TraceRow};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, row: &TraceRow) -> String {
        // serde_json writes non-finite estimates as null.
        serde_json::to_string(row).unwrap_or_else(|_| "null".to_string())
    }
}
