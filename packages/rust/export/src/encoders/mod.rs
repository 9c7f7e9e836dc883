//! Encoder family: streaming (CSV, JSON, XML) and batch (xlsx) encoders.
//!
//! Two deliberately separate capabilities. [`StreamingEncoder`]s emit output
//! incrementally and never touch I/O; the pipeline interleaves their pieces
//! with storage reads. A [`BatchEncoder`] needs the complete record set
//! before the first output byte exists — xlsx requires random-access row
//! insertion inside a zip container — so it drives its own reader and hands
//! the finished document back in one piece.

mod csv;
mod json;
mod xlsx;
mod xml;

pub use csv::CsvEncoder;
pub use json::JsonEncoder;
pub use xlsx::XlsxEncoder;
pub use xml::XmlEncoder;

use resultforge_shared::{CancelToken, Fingerprint, Record, Result};
use resultforge_storage::Store;

/// An encoder that emits output incrementally, one record at a time.
///
/// All four operations are pure string producers.
pub trait StreamingEncoder {
    /// Document preamble, written once before any record.
    fn begin(&self) -> String;

    /// Separator written between successive records (never before the first).
    fn delimiter(&self) -> &'static str;

    /// One record's serialized form.
    fn encode_record(&self, record: &Record) -> Result<String>;

    /// Document trailer, written after the last record.
    fn finalize(&self) -> String;
}

/// A complete document produced by a batch encoder.
#[derive(Debug)]
pub struct EncodedDocument {
    pub bytes: Vec<u8>,
    pub records: usize,
}

/// An encoder that must see the complete record set before producing output.
pub trait BatchEncoder {
    /// Drive a full read of `fingerprint` and build the finished document.
    ///
    /// Checks `cancel` once per record; unreadable blocks are skipped with a
    /// warning, matching the streaming pipeline's failure semantics.
    fn encode<S>(
        &self,
        store: &S,
        fingerprint: &Fingerprint,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<EncodedDocument>> + Send
    where
        S: Store + Sync;
}
