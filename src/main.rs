//! keytable: a standalone tool for flattening RSA public-key record trees
//! into `;`-separated feature tables.
//!
//! This tool walks a two-level directory tree of key record files, extracts
//! bit/residue features from each modulus, annotates rows with source and
//! group ids resolved from mapping files, and enforces per-source (or
//! per-group) skip/emit quotas. A companion remap mode rewrites the
//! length-bucket column of an already-produced table.

use clap::Parser;
use snafu::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keytable::error::{ConfigSnafu, RunError};
use keytable::{run_extract, run_remap, Config};

/// RSA key record tree to feature table converter.
#[derive(Parser, Debug)]
#[command(name = "keytable")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Dry run - validate configuration without processing.
    #[arg(long)]
    dry_run: bool,
}

#[snafu::report]
fn main() -> Result<(), RunError> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("keytable starting");

    let config = Config::from_file(&args.config).context(ConfigSnafu)?;

    if args.dry_run {
        info!("Dry run mode - validating configuration");
        match &config {
            Config::Extract(extract) => {
                info!("Mode: extract");
                info!("Root: {}", extract.root.display());
                info!("Output: {}", extract.output.display());
                info!("Source ids: {}", extract.mappings.source_ids.display());
                info!("Source groups: {}", extract.mappings.source_groups.display());
                info!(
                    "Features: msb={} lsb={} divisors={:?} passthrough={}",
                    extract.features.msb,
                    extract.features.lsb,
                    extract.features.divisors,
                    extract.features.passthrough
                );
                info!(
                    "Quota: skip={} max={:?} balance={:?}",
                    extract.quota.skip_keys, extract.quota.max_keys, extract.quota.balance
                );
            }
            Config::Remap(remap) => {
                info!("Mode: remap");
                info!("Input: {}", remap.input.display());
                info!("Output: {}", remap.output.display());
                info!("Bucket map: {}", remap.bucket_map.display());
                info!("Column: {}", remap.column);
            }
        }
        info!("Configuration is valid");
        return Ok(());
    }

    match config {
        Config::Extract(extract) => {
            let stats = run_extract(&extract)?;
            info!("Conversion completed successfully");
            info!("  Sources processed: {}", stats.sources_processed);
            info!("  Sources skipped: {}", stats.sources_skipped);
            info!("  Files read: {}", stats.files_read);
            info!("  Records skipped: {}", stats.records_skipped);
            info!("  Records emitted: {}", stats.records_emitted);
            if stats.quota_shortfalls > 0 {
                warn!(
                    "  Quota shortfalls: {} (see warnings above)",
                    stats.quota_shortfalls
                );
            }
        }
        Config::Remap(remap) => {
            let stats = run_remap(&remap)?;
            info!("Remap completed successfully");
            info!("  Rows written: {}", stats.rows_written);
            info!("  Rows dropped: {}", stats.rows_dropped);
        }
    }

    Ok(())
}
