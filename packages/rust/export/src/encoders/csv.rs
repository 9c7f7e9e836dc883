//! CSV streaming encoder.

use resultforge_shared::{Record, Result};

use super::StreamingEncoder;
use crate::format::format_cell;

/// Encodes records as CSV rows under a fixed field projection.
///
/// The header row comes from the ordered field names; each record row renders
/// the projected fields with the shared cell-formatting rules. Records are
/// self-terminating (trailing newline), so no delimiter is needed.
pub struct CsvEncoder {
    field_names: Vec<String>,
}

impl CsvEncoder {
    pub fn new(field_names: Vec<String>) -> Self {
        Self { field_names }
    }
}

impl StreamingEncoder for CsvEncoder {
    fn begin(&self) -> String {
        let mut header = self.field_names.join(",");
        header.push('\n');
        header
    }

    fn delimiter(&self) -> &'static str {
        ""
    }

    fn encode_record(&self, record: &Record) -> Result<String> {
        let mut row = self
            .field_names
            .iter()
            .map(|field| format_cell(record.get(field)))
            .collect::<Vec<_>>()
            .join(",");
        row.push('\n');
        Ok(row)
    }

    fn finalize(&self) -> String {
        String::new()
    }
}
