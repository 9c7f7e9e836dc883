//! Pluggable key-value storage for intermediate crawl blocks.
//!
//! The parse stage (external) writes blocks under keys derived by
//! [`resultforge_shared::storage_key`]; the export side only ever reads them
//! back and closes the handle. The [`Store`] trait captures exactly that
//! boundary: opaque keys in, bytes out, no enumeration, no deletion.
//!
//! Two minimal drivers ship here — an in-process [`MemoryStore`] and a
//! file-per-key [`DiskStore`]. Replication, indexing, and richer backends
//! are driver concerns outside this workspace.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use resultforge_shared::{Result, ResultForgeError};

/// Read-side handle to the block store.
///
/// Implementations must be safe for concurrent reads from multiple reader
/// instances; the export pipeline shares one handle between a parent reader
/// and its nested detail-chain readers.
pub trait Store {
    /// Fetch the value stored under `key`.
    ///
    /// Returns [`ResultForgeError::NotFound`] when the key is absent — the
    /// reader uses that signal to detect page boundaries — and
    /// [`ResultForgeError::Storage`] for any other backend failure.
    fn read(&self, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Release the handle. The owning pipeline calls this exactly once, on
    /// every exit path.
    fn close(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process block store backed by a `HashMap`.
///
/// The `insert` writer path exists for the parse stage and for tests; the
/// export side never writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: RwLock<HashMap<String, Vec<u8>>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block under `key`, replacing any previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let mut blocks = self.blocks.write().expect("block map poisoned");
        blocks.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.blocks.read().expect("block map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ResultForgeError::Storage("store is closed".into()));
        }
        let blocks = self.blocks.read().expect("block map poisoned");
        blocks
            .get(key)
            .cloned()
            .ok_or_else(|| ResultForgeError::not_found(key))
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        tracing::debug!("memory store closed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DiskStore
// ---------------------------------------------------------------------------

/// File-per-key block store under a root directory.
///
/// Keys are `{fingerprint}-{page}-{block}` and therefore filesystem-safe.
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a block, creating the root directory on demand.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| ResultForgeError::io(&self.root, e))?;
        let path = self.root.join(key);
        std::fs::write(&path, value).map_err(|e| ResultForgeError::io(&path, e))
    }
}

impl Store for DiskStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(key);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ResultForgeError::not_found(key),
            _ => ResultForgeError::Storage(format!("{}: {e}", path.display())),
        })
    }

    fn close(&self) -> Result<()> {
        tracing::debug!(root = %self.root.display(), "disk store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rf-storage-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.insert("fp-0-0", b"{\"a\":1}".as_slice());

        let bytes = store.read("fp-0-0").await.unwrap();
        assert_eq!(bytes, b"{\"a\":1}");

        let err = store.read("fp-0-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn memory_store_read_after_close_fails() {
        let store = MemoryStore::new();
        store.insert("fp-0-0", b"{}".as_slice());
        store.close().unwrap();

        let err = store.read("fp-0-0").await.unwrap_err();
        assert!(matches!(err, ResultForgeError::Storage(_)));
    }

    #[tokio::test]
    async fn disk_store_roundtrip() {
        let root = temp_dir();
        let store = DiskStore::open(&root);

        store.put("fp-0-0", b"{\"title\":\"x\"}").unwrap();
        let bytes = store.read("fp-0-0").await.unwrap();
        assert_eq!(bytes, b"{\"title\":\"x\"}");

        let err = store.read("fp-1-0").await.unwrap_err();
        assert!(err.is_not_found());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn disk_store_creates_root_on_demand() {
        let root = temp_dir().join("nested/deeper");
        let store = DiskStore::open(&root);
        store.put("fp-0-0", b"{}").unwrap();
        assert!(root.join("fp-0-0").exists());

        let _ = std::fs::remove_dir_all(root.parent().unwrap());
    }
}
