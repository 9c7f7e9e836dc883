//! Spreadsheet (xlsx) batch encoder.

use rust_xlsxwriter::Workbook;
use tracing::warn;

use resultforge_shared::{CancelToken, Fingerprint, Result, ResultForgeError};
use resultforge_storage::Store;

use super::{BatchEncoder, EncodedDocument};
use crate::format::format_cell;
use crate::reader::{MAX_CONSECUTIVE_READ_FAILURES, ResultReader};

/// Builds a one-sheet workbook: header row from the field projection, one
/// row per record, cells rendered with the shared flat-cell rules.
pub struct XlsxEncoder {
    field_names: Vec<String>,
}

impl XlsxEncoder {
    pub fn new(field_names: Vec<String>) -> Self {
        Self { field_names }
    }
}

impl BatchEncoder for XlsxEncoder {
    async fn encode<S>(
        &self,
        store: &S,
        fingerprint: &Fingerprint,
        cancel: &CancelToken,
    ) -> Result<EncodedDocument>
    where
        S: Store + Sync,
    {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, name) in self.field_names.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, name)
                .map_err(|e| ResultForgeError::encode(e.to_string()))?;
        }

        let mut reader = ResultReader::new(store, fingerprint.clone());
        let mut row: u32 = 1;
        let mut failures = 0usize;
        loop {
            if cancel.is_cancelled() {
                return Err(ResultForgeError::Cancelled);
            }
            match reader.next().await {
                Ok(Some(record)) => {
                    failures = 0;
                    for (col, field) in self.field_names.iter().enumerate() {
                        let cell = format_cell(record.get(field));
                        worksheet
                            .write_string(row, col as u16, &cell)
                            .map_err(|e| ResultForgeError::encode(e.to_string()))?;
                    }
                    row += 1;
                }
                Ok(None) => break,
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

        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| ResultForgeError::encode(e.to_string()))?;

        Ok(EncodedDocument {
            bytes,
            records: (row - 1) as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultforge_storage::MemoryStore;

    #[tokio::test]
    async fn builds_workbook_with_header_and_rows() {
        let store = MemoryStore::new();
        store.insert("fp-0-0", r#"{"name":"a","qty":1}"#.as_bytes());
        store.insert("fp-0-1", r#"{"name":"b","qty":2}"#.as_bytes());

        let encoder = XlsxEncoder::new(vec!["name".into(), "qty".into()]);
        let document = encoder
            .encode(&store, &Fingerprint::new("fp"), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(document.records, 2);
        // xlsx containers are zip archives
        assert_eq!(&document.bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn cancellation_aborts_before_save() {
        let store = MemoryStore::new();
        store.insert("fp-0-0", r#"{"name":"a"}"#.as_bytes());

        let cancel = CancelToken::new();
        cancel.cancel();

        let encoder = XlsxEncoder::new(vec!["name".into()]);
        let err = encoder
            .encode(&store, &Fingerprint::new("fp"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ResultForgeError::Cancelled));
    }

    #[tokio::test]
    async fn persistently_failing_backend_aborts_encode() {
        struct DeadStore;

        impl Store for DeadStore {
            async fn read(&self, _key: &str) -> Result<Vec<u8>> {
                Err(ResultForgeError::Storage("backend down".into()))
            }

            fn close(&self) -> Result<()> {
                Ok(())
            }
        }

        let encoder = XlsxEncoder::new(vec!["name".into()]);
        let err = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            encoder.encode(&DeadStore, &Fingerprint::new("fp"), &CancelToken::new()),
        )
        .await
        .expect("encode must terminate on a dead backend")
        .unwrap_err();
        assert!(matches!(err, ResultForgeError::Storage(_)));
    }
}
