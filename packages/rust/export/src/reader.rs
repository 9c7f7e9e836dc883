//! Storage result reader: pagination plus recursive detail resolution.
//!
//! The parse stage writes each result set as a flat sequence of blocks keyed
//! `{fingerprint}-{page}-{block}`, with block indices contiguous from 0
//! within a page. [`ResultReader`] walks that sequence, detects page
//! boundaries by key absence, and stitches nested detail chains back into
//! their parent records before handing them to an encoder.

use std::pin::Pin;

use tracing::debug;

use resultforge_shared::{Fingerprint, Record, Result, Value, storage_key};
use resultforge_storage::Store;

/// Consecutive surfaced reader failures a skip-and-continue consumer
/// tolerates before giving up on the stream. A backend that fails every
/// read never returns not-found, so without this bound the skip path
/// would loop forever.
pub(crate) const MAX_CONSECUTIVE_READ_FAILURES: usize = 8;

/// Pulls the record sequence for one fingerprint out of the store.
///
/// Not rewindable; restart by constructing a new reader.
pub struct ResultReader<'a, S: Store> {
    store: &'a S,
    fingerprint: Fingerprint,
    page: u64,
    block: u64,
}

impl<'a, S: Store + Sync> ResultReader<'a, S> {
    pub fn new(store: &'a S, fingerprint: Fingerprint) -> Self {
        Self {
            store,
            fingerprint,
            page: 0,
            block: 0,
        }
    }

    /// Produce the next fully resolved record.
    ///
    /// `Ok(None)` signals end-of-stream — normal termination, never logged
    /// as an error. Surfaced errors consume their slot, so callers that skip
    /// and continue always make progress.
    pub async fn next(&mut self) -> Result<Option<Record>> {
        let Some(block) = self.fetch_block().await? else {
            return Ok(None);
        };
        Ok(Some(resolve_details(self.store, block).await))
    }

    /// Fetch and decode the block at the cursor, following pagination.
    async fn fetch_block(&mut self) -> Result<Option<Record>> {
        match self.read_at_cursor().await {
            Ok(block) => Ok(Some(block)),
            Err(e) if e.is_not_found() => {
                // Page boundary: retry exactly once on the next page. Any
                // failure on the retry ends the stream — see DESIGN.md on
                // why backend errors collapse here.
                self.page += 1;
                self.block = 0;
                match self.read_at_cursor().await {
                    Ok(block) => Ok(Some(block)),
                    Err(_) => Ok(None),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Read and decode the current key, advancing the block cursor.
    ///
    /// The slot counts as consumed on success and on surfaced errors alike;
    /// only not-found leaves the cursor in place for the pagination retry.
    async fn read_at_cursor(&mut self) -> Result<Record> {
        let key = storage_key(&self.fingerprint, self.page, self.block);
        let bytes = match self.store.read(&key).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Err(e),
            Err(e) => {
                self.block += 1;
                return Err(e);
            }
        };
        self.block += 1;

        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| resultforge_shared::ResultForgeError::decode(&key, e.to_string()))?;
        Ok(Record::from_json_map(map))
    }
}

/// Replace detail-chain fingerprints with the records they point at.
///
/// One resolved sub-block becomes a single nested record, several become an
/// array, none removes the field. Fields that already hold resolved records
/// pass through untouched.
async fn resolve_details<S: Store + Sync>(store: &S, mut record: Record) -> Record {
    for field in record.detail_fields() {
        let Some(chain) = record.get(&field).and_then(Value::as_str) else {
            continue;
        };
        let mut details = drain_chain(store, Fingerprint::new(chain)).await;
        let resolved = match details.len() {
            0 => None,
            1 => details.pop().map(Value::Record),
            _ => Some(Value::Records(details)),
        };
        match resolved {
            Some(value) => record.insert(field, value),
            None => {
                record.remove(&field);
            }
        }
    }
    record
}

/// Drain an entire detail chain, in read order.
///
/// A chain may hold any number of blocks. A sub-block that fails to resolve
/// is skipped — a partially missing detail set never aborts the parent read —
/// but repeated consecutive failures abandon the chain with whatever was
/// collected so far. Boxed because each detail block may reference chains of
/// its own.
fn drain_chain<'a, S: Store + Sync>(
    store: &'a S,
    fingerprint: Fingerprint,
) -> Pin<Box<dyn Future<Output = Vec<Record>> + Send + 'a>> {
    Box::pin(async move {
        let mut reader = ResultReader::new(store, fingerprint);
        let mut records = Vec::new();
        let mut failures = 0usize;
        loop {
            match reader.next().await {
                Ok(Some(record)) => {
                    failures = 0;
                    records.push(record);
                }
                Ok(None) => break,
                Err(e) => {
                    failures += 1;
                    debug!(error = %e, "skipping unresolvable detail block");
                    if failures >= MAX_CONSECUTIVE_READ_FAILURES {
                        debug!("giving up on detail chain after repeated read failures");
                        break;
                    }
                }
            }
        }
        records
    })
}
