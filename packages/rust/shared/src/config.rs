//! Application configuration for ResultForge.
//!
//! User config lives at `~/.resultforge/resultforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResultForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "resultforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".resultforge";

// ---------------------------------------------------------------------------
// Storage backend selection
// ---------------------------------------------------------------------------

/// Which key-value store holds the intermediate blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process map, for tests and single-run pipelines.
    Memory,
    /// One file per key under a root directory.
    Disk,
}

impl std::str::FromStr for StorageBackend {
    type Err = ResultForgeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            other => Err(ResultForgeError::config(format!(
                "unknown storage backend {other:?} (expected \"memory\" or \"disk\")"
            ))),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config structs (matching resultforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Export defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Storage driver settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory where export files are written.
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Default storage backend for intermediate blocks.
    #[serde(default = "default_backend")]
    pub storage_backend: StorageBackend,

    /// Gzip-compress export files.
    #[serde(default)]
    pub compression: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            storage_backend: default_backend(),
            compression: false,
        }
    }
}

fn default_results_dir() -> String {
    "results".into()
}
fn default_backend() -> StorageBackend {
    StorageBackend::Disk
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for the disk backend.
    #[serde(default = "default_disk_root")]
    pub disk_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            disk_root: default_disk_root(),
        }
    }
}

fn default_disk_root() -> String {
    "blocks".into()
}

// ---------------------------------------------------------------------------
// Encoding config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one export run.
///
/// Passed explicitly into the pipeline constructor; nothing in the export
/// path reads process-wide configuration at encode time.
#[derive(Debug, Clone)]
pub struct EncodingConfig {
    /// Which store backend the blocks live in.
    pub storage_backend: StorageBackend,
    /// Directory where the output file is written (created on demand).
    pub results_dir: PathBuf,
    /// Wrap the sink in best-speed gzip compression.
    pub compression: bool,
}

impl From<&AppConfig> for EncodingConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            storage_backend: config.defaults.storage_backend,
            results_dir: PathBuf::from(&config.defaults.results_dir),
            compression: config.defaults.compression,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.resultforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ResultForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.resultforge/resultforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ResultForgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ResultForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ResultForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ResultForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ResultForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("results_dir"));
        assert!(toml_str.contains("disk_root"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.storage_backend, StorageBackend::Disk);
        assert!(!parsed.defaults.compression);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
results_dir = "/tmp/exports"
compression = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.results_dir, "/tmp/exports");
        assert!(config.defaults.compression);
        assert_eq!(config.defaults.storage_backend, StorageBackend::Disk);
        assert_eq!(config.storage.disk_root, "blocks");
    }

    #[test]
    fn backend_from_str() {
        assert_eq!(
            "Memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert_eq!(
            "disk".parse::<StorageBackend>().unwrap(),
            StorageBackend::Disk
        );
        assert!("mongodb".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn encoding_config_from_app_config() {
        let app = AppConfig::default();
        let encoding = EncodingConfig::from(&app);
        assert_eq!(encoding.results_dir, PathBuf::from("results"));
        assert_eq!(encoding.storage_backend, StorageBackend::Disk);
        assert!(!encoding.compression);
    }
}
