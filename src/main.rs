// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repofinder CLI - find every git repository under a directory

use anyhow::{bail, Context, Result};
use clap::Parser;
use repofinder::config::{FailurePolicy, QueryKind, ScanOptions, Settings};
use repofinder::coordinator::ScanCoordinator;
use repofinder::render;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "repofinder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory to scan
    #[arg(long)]
    root: Option<String>,

    /// Top-level directories per scan task [default: 3]
    #[arg(long, allow_negative_numbers = true)]
    chunk_size: Option<i64>,

    /// Look up the author and date of each repository's first commit
    #[arg(long)]
    dig: bool,

    /// History query used with --dig
    #[arg(long, value_enum)]
    query: Option<QueryKind>,

    /// Marker directory that identifies a repository
    #[arg(long)]
    marker: Option<String>,

    /// Report failed chunks instead of aborting the whole scan
    #[arg(long)]
    keep_going: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "REPOFINDER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::from_str(&settings.log_level).unwrap_or(tracing::Level::INFO),
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut options = ScanOptions::from_settings(cli.root.unwrap_or_default(), &settings);
    options.dig = cli.dig;
    if let Some(chunk_size) = cli.chunk_size {
        options.chunk_size = chunk_size;
    }
    if let Some(query) = cli.query {
        options.query = query;
    }
    if let Some(marker) = cli.marker {
        options.marker = marker;
    }
    if cli.keep_going {
        options.failure_policy = FailurePolicy::Continue;
    }

    let config = options.validate()?;
    let report = ScanCoordinator::new(config).run().await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        render::write_json(&mut out, &report.records)?;
    } else {
        render::write_text(&mut out, &report.records)?;
    }
    out.flush()?;

    if !report.failures.is_empty() {
        render::write_failures(&mut io::stderr(), &report)?;
        bail!("{} of the scan chunks failed", report.failures.len());
    }

    Ok(())
}
