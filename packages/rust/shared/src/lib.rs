//! Shared types, error model, and configuration for ResultForge.
//!
//! This crate is the foundation depended on by all other ResultForge crates.
//! It provides:
//! - [`ResultForgeError`] — the unified error type
//! - Domain types ([`Fingerprint`], [`Record`], [`Value`], [`storage_key`])
//! - Configuration ([`AppConfig`], [`EncodingConfig`], config loading)
//! - [`CancelToken`] — cooperative cancellation for export streams

pub mod cancel;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use cancel::CancelToken;
pub use config::{
    AppConfig, DefaultsConfig, EncodingConfig, StorageBackend, StorageConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ResultForgeError, Result};
pub use types::{DETAIL_FIELD_MARKER, Fingerprint, Record, Value, is_detail_field, storage_key};
