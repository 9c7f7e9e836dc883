//! ResultForge CLI — export scraped result sets into delivery formats.
//!
//! Reads intermediate result blocks out of storage, reassembles records
//! with their detail chains, and writes CSV, JSON, JSON-Lines, XML, or
//! xlsx files, optionally gzip-compressed.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
