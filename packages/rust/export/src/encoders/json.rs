//! JSON streaming encoder: array mode and line-delimited mode.

use resultforge_shared::{Record, Result, ResultForgeError};

use super::StreamingEncoder;

/// Encodes records as standalone JSON objects.
///
/// Array mode wraps the stream in `[`…`]` with `,` delimiters; lines mode
/// separates objects by newline with no enclosing brackets. No field
/// projection: whatever fields a record carries get emitted.
pub struct JsonEncoder {
    lines: bool,
}

impl JsonEncoder {
    /// JSON array output (`[{…},{…}]`).
    pub fn array() -> Self {
        Self { lines: false }
    }

    /// JSON-Lines output (one object per line).
    pub fn lines() -> Self {
        Self { lines: true }
    }
}

impl StreamingEncoder for JsonEncoder {
    fn begin(&self) -> String {
        if self.lines { String::new() } else { "[".into() }
    }

    fn delimiter(&self) -> &'static str {
        if self.lines { "\n" } else { "," }
    }

    fn encode_record(&self, record: &Record) -> Result<String> {
        serde_json::to_string(record).map_err(|e| ResultForgeError::encode(e.to_string()))
    }

    fn finalize(&self) -> String {
        if self.lines { String::new() } else { "]".into() }
    }
}
