//! Result reassembly and encoding.
//!
//! Reads scraped result blocks back out of storage, stitches detail chains
//! into their parent records, and streams the result set into a delivery
//! format (CSV, JSON, JSON-Lines, XML, or xlsx), optionally gzip-compressed.

pub mod encoders;
pub mod format;
pub mod pipeline;
pub mod reader;
pub mod sink;

pub use encoders::{BatchEncoder, CsvEncoder, EncodedDocument, JsonEncoder, StreamingEncoder, XlsxEncoder, XmlEncoder};
pub use pipeline::{ExportOutcome, ExportPipeline, ExportRequest, OutputFormat};
pub use reader::ResultReader;
pub use sink::Sink;
