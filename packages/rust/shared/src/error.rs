//! Error types for ResultForge.
//!
//! Library crates use [`ResultForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! End-of-stream is deliberately *not* a variant: the result reader signals
//! exhaustion with `Ok(None)`. Callers match on variants, never on error
//! message text.

use std::path::PathBuf;

/// Top-level error type for all ResultForge operations.
#[derive(Debug, thiserror::Error)]
pub enum ResultForgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Key absent from the store. Drives page-boundary detection in the
    /// result reader; callers outside the reader rarely see it.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// Storage backend failure distinct from not-found.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored block could not be decoded as a JSON object.
    #[error("decode error at {key}: {message}")]
    Decode { key: String, message: String },

    /// A value shape that cannot be represented in the target format.
    #[error("encode error: {message}")]
    Encode { message: String },

    /// The caller requested abort via a [`crate::CancelToken`].
    #[error("export cancelled")]
    Cancelled,

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ResultForgeError>;

impl ResultForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a not-found error for a storage key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a decode error for a storage key.
    pub fn decode(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create an encode error from any displayable message.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is the not-found signal used for page boundaries.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
