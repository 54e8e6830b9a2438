// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then the config file, then
//! `REPOFINDER_*` environment variables. Command-line flags override the
//! result, and the merged [`ScanOptions`] are validated into a [`ScanConfig`].

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Default number of top-level directories per scan task
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(size) => size,
    None => unreachable!(),
};

/// Default marker directory
pub const DEFAULT_MARKER: &str = ".git";

/// Which history query backs metadata extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// `git log --reverse | head -3`, default date format
    #[default]
    Log,
    /// `git log --format=...` with an ISO-strict date
    Formatted,
}

/// What to do when a chunk fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// First error aborts the whole run
    #[default]
    Abort,
    /// Record the failed chunk and keep the other results
    Continue,
}

/// Settings file / environment layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default chunk size when `--chunk-size` is not given
    pub chunk_size: i64,
    /// Marker directory name
    pub marker: String,
    /// History query used when digging
    pub query: QueryKind,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunk_size: i64::try_from(DEFAULT_CHUNK_SIZE.get()).unwrap_or(i64::MAX),
            marker: DEFAULT_MARKER.to_string(),
            query: QueryKind::Log,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `file` (or the user config file) and the environment
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("chunk_size", defaults.chunk_size)?
            .set_default("marker", defaults.marker)?
            .set_default("query", "log")?
            .set_default("log_level", defaults.log_level)?;

        builder = match file {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => match user_config_file() {
                Some(path) => builder.add_source(config::File::from(path).required(false)),
                None => builder,
            },
        };

        builder
            .add_source(config::Environment::with_prefix("REPOFINDER").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

/// `<config dir>/repofinder/config.toml` for the current user
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "repofinder")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Scan options as given, before validation
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory whose children are scanned
    pub root: String,
    /// Top-level directories per scan task
    pub chunk_size: i64,
    /// Extract first-commit metadata
    pub dig: bool,
    /// Marker directory name
    pub marker: String,
    /// History query used when digging
    pub query: QueryKind,
    /// Failure handling
    pub failure_policy: FailurePolicy,
}

impl ScanOptions {
    /// Options for `root` with every other field taken from `settings`
    #[must_use]
    pub fn from_settings(root: impl Into<String>, settings: &Settings) -> Self {
        Self {
            root: root.into(),
            chunk_size: settings.chunk_size,
            dig: false,
            marker: settings.marker.clone(),
            query: settings.query,
            failure_policy: FailurePolicy::Abort,
        }
    }

    /// Check every field, reporting all failures at once
    pub fn validate(self) -> Result<ScanConfig, ValidationError> {
        let mut errors = ValidationError::default();

        if self.root.trim().is_empty() {
            errors.push("root", "must not be empty");
        }

        let chunk_size = usize::try_from(self.chunk_size)
            .ok()
            .and_then(NonZeroUsize::new);
        if chunk_size.is_none() {
            errors.push(
                "chunk-size",
                format!("must be a positive integer (got {})", self.chunk_size),
            );
        }

        if self.marker.is_empty() || self.marker.contains(['/', '\\']) {
            errors.push(
                "marker",
                format!("must be a single directory name (got {:?})", self.marker),
            );
        }

        match chunk_size {
            Some(chunk_size) if errors.is_empty() => Ok(ScanConfig {
                root: PathBuf::from(self.root),
                chunk_size,
                dig: self.dig,
                marker: self.marker,
                query: self.query,
                failure_policy: self.failure_policy,
            }),
            _ => Err(errors),
        }
    }
}

/// Validated scan configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory whose children are scanned
    pub root: PathBuf,
    /// Top-level directories per scan task
    pub chunk_size: NonZeroUsize,
    /// Extract first-commit metadata
    pub dig: bool,
    /// Marker directory name
    pub marker: String,
    /// History query used when digging
    pub query: QueryKind,
    /// Failure handling
    pub failure_policy: FailurePolicy,
}

impl ScanConfig {
    /// Config for `root` with defaults everywhere else
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            dig: false,
            marker: DEFAULT_MARKER.to_string(),
            query: QueryKind::Log,
            failure_policy: FailurePolicy::Abort,
        }
    }
}
