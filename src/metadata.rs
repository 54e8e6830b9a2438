// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! First-commit metadata - ask git for the oldest log entry and pick out
//! the author and date
//!
//! git's human log format is not a stable contract, so parsing is a plain
//! substring search for the `Author:` and `Date:` labels. Anything missing or
//! malformed leaves the matching field empty; it never fails the scan.

use crate::error::{Result, ScanError};
use crate::types::CommitInfo;
use chrono::DateTime;
use std::path::Path;
use std::process::Command;
use tracing::trace;

/// Shell used to run the history pipeline
const SHELL: &str = "sh";

/// Oldest three lines of the default log: `commit`, `Author:` and `Date:`
pub const LOG_QUERY: &str = "git log --reverse | head -3";

/// Same labels, but with an ISO-strict author date git formats for us
pub const FORMATTED_QUERY: &str =
    "git log --reverse --format='Author: %an <%ae>%nDate: %aI' | head -2";

const AUTHOR_LABEL: &str = "Author:";
const DATE_LABEL: &str = "Date:";

/// Source of first-commit metadata for a repository root
pub trait MetadataExtractor: Send + Sync {
    /// Extract commit info for the repository rooted at `repo_dir`
    fn extract(&self, repo_dir: &Path) -> Result<CommitInfo>;
}

/// Runs `git log --reverse | head -3` and scans the text output
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLogExtractor;

impl MetadataExtractor for GitLogExtractor {
    fn extract(&self, repo_dir: &Path) -> Result<CommitInfo> {
        let output = run_query(LOG_QUERY, repo_dir)?;
        Ok(parse_log_output(&output))
    }
}

/// Asks git to print the two labels itself, with an RFC 3339 date
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattedLogExtractor;

impl MetadataExtractor for FormattedLogExtractor {
    fn extract(&self, repo_dir: &Path) -> Result<CommitInfo> {
        let output = run_query(FORMATTED_QUERY, repo_dir)?;
        Ok(parse_log_output(&output))
    }
}

/// Run `query` through the shell inside `dir` and return its stdout
fn run_query(query: &str, dir: &Path) -> Result<String> {
    let tool_error = |reason: String| ScanError::ExternalTool {
        command: query.to_string(),
        dir: dir.to_path_buf(),
        reason,
    };

    let output = Command::new(SHELL)
        .arg("-c")
        .arg(query)
        .current_dir(dir)
        .output()
        .map_err(|e| tool_error(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(tool_error(format!("{}: {}", output.status, stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Pull the author and creation date out of raw log text.
///
/// The date must be RFC 3339 (`2021-05-01T10:00:00+00:00`); git's default
/// `Mon May 1 10:00:00 2021 +0000` does not parse and yields `None`.
#[must_use]
pub fn parse_log_output(output: &str) -> CommitInfo {
    let author = labeled_value(output, AUTHOR_LABEL)
        .unwrap_or_default()
        .to_string();

    let created_at = labeled_value(output, DATE_LABEL)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok());

    trace!(author = %author, created_at = ?created_at, "parsed log output");

    CommitInfo { author, created_at }
}

/// Text after the first `label`, up to the end of that line, trimmed
fn labeled_value<'a>(output: &'a str, label: &str) -> Option<&'a str> {
    let (_, rest) = output.split_once(label)?;
    let line = rest.lines().next().unwrap_or_default();
    Some(line.trim())
}
