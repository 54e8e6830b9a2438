// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the scan pipeline

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Everything that can stop a scan
#[derive(Debug, Error)]
pub enum ScanError {
    /// Configuration rejected before any I/O
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Root unlistable or a subtree entry unreadable
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The history query could not be run or exited with an error
    #[error("`{command}` failed in {}: {reason}", .dir.display())]
    ExternalTool {
        /// Shell command line
        command: String,
        /// Working directory of the command
        dir: PathBuf,
        /// Spawn error or exit status with stderr
        reason: String,
    },

    /// A scanner task panicked or was cancelled
    #[error("scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Another chunk failed first and the run was stopped
    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Create a filesystem error for `path`
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        Self::Filesystem { path, source }
    }
}

/// A single rejected configuration field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as spelled on the command line
    pub field: &'static str,
    /// Why the value was rejected
    pub reason: String,
}

/// All fields that failed validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// Failing fields, in declaration order
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Record a failing field
    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            reason: reason.into(),
        });
    }

    /// True when no field failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of the failing fields
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid arguments")?;
        for (i, field) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} {}", field.field, field.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
