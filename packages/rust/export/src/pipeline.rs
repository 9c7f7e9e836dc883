//! Export pipeline: read next record → encode → write, under cancellation.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use resultforge_shared::{
    CancelToken, EncodingConfig, Fingerprint, Result, ResultForgeError,
};
use resultforge_storage::Store;

use crate::encoders::{
    BatchEncoder, CsvEncoder, JsonEncoder, StreamingEncoder, XlsxEncoder, XmlEncoder,
};
use crate::reader::{MAX_CONSECUTIVE_READ_FAILURES, ResultReader};
use crate::sink::Sink;

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

/// Delivery format for one export request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    JsonLines,
    Xml,
    Xlsx,
}

impl OutputFormat {
    /// File extension (before any compression wrapping).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Xml => "xml",
            Self::Xlsx => "xlsx",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ResultForgeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "json-lines" => Ok(Self::JsonLines),
            "xml" => Ok(Self::Xml),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(ResultForgeError::config(format!(
                "unknown output format {other:?} (expected csv, json, jsonl, xml, or xlsx)"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

/// One export request.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Result set to export.
    pub fingerprint: Fingerprint,
    /// Delivery format.
    pub format: OutputFormat,
    /// Ordered field projection (CSV/XML/xlsx; JSON ignores it).
    pub fields: Vec<String>,
}

/// What one successful export produced.
#[derive(Debug)]
pub struct ExportOutcome {
    /// Absolute or relative path of the written file.
    pub path: PathBuf,
    /// Number of records written.
    pub records: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives one output stream: owns the store handle and the sink for the
/// lifetime of the export, closing the store exactly once on every exit path.
pub struct ExportPipeline<S: Store> {
    store: S,
    config: EncodingConfig,
}

impl<S: Store + Sync> ExportPipeline<S> {
    pub fn new(store: S, config: EncodingConfig) -> Self {
        Self { store, config }
    }

    /// Run one export. Consumes the pipeline.
    #[instrument(skip_all, fields(fingerprint = %request.fingerprint, format = %request.format))]
    pub async fn export(
        self,
        request: &ExportRequest,
        cancel: &CancelToken,
    ) -> Result<ExportOutcome> {
        let outcome = self.run(request, cancel).await;
        // the store is released here and nowhere else
        if let Err(e) = self.store.close() {
            warn!(error = %e, "store close failed");
        }
        outcome
    }

    async fn run(&self, request: &ExportRequest, cancel: &CancelToken) -> Result<ExportOutcome> {
        let mut sink = Sink::create(
            &self.config.results_dir,
            &request.fingerprint,
            request.format.extension(),
            self.config.compression,
        )?;
        info!(path = %sink.path().display(), "export started");

        let records = match request.format {
            OutputFormat::Xlsx => {
                let encoder = XlsxEncoder::new(request.fields.clone());
                let document = encoder
                    .encode(&self.store, &request.fingerprint, cancel)
                    .await?;
                sink.write_all(&document.bytes)?;
                document.records
            }
            OutputFormat::Csv => {
                let encoder = CsvEncoder::new(request.fields.clone());
                self.stream(&encoder, request, &mut sink, cancel).await?
            }
            OutputFormat::Json => {
                self.stream(&JsonEncoder::array(), request, &mut sink, cancel)
                    .await?
            }
            OutputFormat::JsonLines => {
                self.stream(&JsonEncoder::lines(), request, &mut sink, cancel)
                    .await?
            }
            OutputFormat::Xml => {
                let encoder = XmlEncoder::new(request.fields.clone());
                self.stream(&encoder, request, &mut sink, cancel).await?
            }
        };

        let path = sink.finish()?;
        info!(records, path = %path.display(), "export complete");
        Ok(ExportOutcome { path, records })
    }

    /// The streaming loop: begin, then per record — cancellation check,
    /// read, delimiter (between records only), encode, write.
    ///
    /// Reader errors skip the bad record, but a run of consecutive failures
    /// aborts with the last error; encode and sink errors abort immediately.
    /// Cancellation short-circuits before `finalize`, leaving a truncated
    /// file — preserved behavior, see DESIGN.md.
    async fn stream<E: StreamingEncoder>(
        &self,
        encoder: &E,
        request: &ExportRequest,
        sink: &mut Sink,
        cancel: &CancelToken,
    ) -> Result<usize> {
        let mut reader = ResultReader::new(&self.store, request.fingerprint.clone());
        sink.write_all(encoder.begin().as_bytes())?;

        let mut written = 0usize;
        let mut failures = 0usize;
        loop {
            if cancel.is_cancelled() {
                return Err(ResultForgeError::Cancelled);
            }
            match reader.next().await {
                Ok(Some(record)) => {
                    failures = 0;
                    let encoded = encoder.encode_record(&record)?;
                    if written > 0 {
                        sink.write_all(encoder.delimiter().as_bytes())?;
                    }
                    sink.write_all(encoded.as_bytes())?;
                    written += 1;
                }
                Ok(None) => {
                    sink.write_all(encoder.finalize().as_bytes())?;
                    return Ok(written);
                }
                Err(e) => {
                    failures += 1;
                    if failures >= MAX_CONSECUTIVE_READ_FAILURES {
                        return Err(e);
                    }
                    warn!(error = %e, "skipping unreadable block");
                    // a store that fails synchronously gives this loop no
                    // await point, so yield to stay cancellable
                    tokio::task::yield_now().await;
                }
            }
        }
    }
}
