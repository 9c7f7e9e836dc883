//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::{info, warn};

use resultforge_export::{ExportOutcome, ExportPipeline, ExportRequest, OutputFormat};
use resultforge_shared::{
    CancelToken, EncodingConfig, Fingerprint, StorageBackend, config_file_path, init_config,
    load_config,
};
use resultforge_storage::{DiskStore, MemoryStore};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ResultForge — turn scraped result blocks into delivery files.
#[derive(Parser)]
#[command(
    name = "resultforge",
    version,
    about = "Export scraped result sets as CSV, JSON, JSON-Lines, XML, or xlsx.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Export one result set from storage into a delivery file.
    Export {
        /// Fingerprint of the result set to export.
        fingerprint: String,

        /// Output format: csv, json, jsonl, xml, or xlsx.
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Ordered field projection, comma-separated (required for csv, xml, xlsx).
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Gzip-compress the output file.
        #[arg(long)]
        compress: bool,

        /// Directory for export files (overrides config).
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Storage backend holding the blocks: memory or disk (overrides config).
        #[arg(long)]
        backend: Option<StorageBackend>,

        /// Root directory for the disk backend (overrides config).
        #[arg(long)]
        disk_root: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "resultforge=info",
        1 => "resultforge=debug",
        _ => "resultforge=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Export {
            fingerprint,
            format,
            fields,
            compress,
            results_dir,
            backend,
            disk_root,
        } => {
            cmd_export(
                &fingerprint,
                format,
                fields,
                compress,
                results_dir,
                backend,
                disk_root,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn cmd_export(
    fingerprint: &str,
    format: OutputFormat,
    fields: Vec<String>,
    compress: bool,
    results_dir: Option<PathBuf>,
    backend: Option<StorageBackend>,
    disk_root: Option<PathBuf>,
) -> Result<()> {
    let app_config = load_config()?;

    // Flags override the config file.
    let mut config = EncodingConfig::from(&app_config);
    if let Some(dir) = results_dir {
        config.results_dir = dir;
    }
    if let Some(b) = backend {
        config.storage_backend = b;
    }
    if compress {
        config.compression = true;
    }

    if backend_starts_empty(config.storage_backend) {
        warn!("memory backend holds no blocks from previous runs; the export will be empty");
    }

    let needs_projection = matches!(
        format,
        OutputFormat::Csv | OutputFormat::Xml | OutputFormat::Xlsx
    );
    if needs_projection && fields.is_empty() {
        return Err(eyre!("--fields is required for {format} output"));
    }

    let request = ExportRequest {
        fingerprint: Fingerprint::new(fingerprint),
        format,
        fields,
    };

    // Ctrl-C flips the token; the pipeline checks it between records.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling export");
                cancel.cancel();
            }
        });
    }

    info!(fingerprint, format = %request.format, "starting export");

    let outcome = match config.storage_backend {
        StorageBackend::Memory => {
            let pipeline = ExportPipeline::new(MemoryStore::new(), config);
            pipeline.export(&request, &cancel).await?
        }
        StorageBackend::Disk => {
            let root = disk_root
                .unwrap_or_else(|| PathBuf::from(&app_config.storage.disk_root));
            let pipeline = ExportPipeline::new(DiskStore::open(root), config);
            pipeline.export(&request, &cancel).await?
        }
    };

    print_summary(&outcome);
    Ok(())
}

/// A fresh process cannot see blocks written by an earlier run through the
/// memory backend, so exporting from it yields a header-only file.
fn backend_starts_empty(backend: StorageBackend) -> bool {
    matches!(backend, StorageBackend::Memory)
}

fn print_summary(outcome: &ExportOutcome) {
    println!();
    println!("  Export complete!");
    println!("  Records: {}", outcome.records);
    println!("  Path:    {}", outcome.path.display());
    println!();
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created config file at {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
