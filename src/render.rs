// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Output rendering for scan results

use crate::types::{CommitInfo, RepositoryRecord, ScanReport};
use std::io::{self, Write};

/// Shown in place of a timestamp that could not be parsed
pub const UNKNOWN_TIMESTAMP: &str = "unknown";

/// Write one block per record, each followed by a blank line
pub fn write_text<W: Write>(out: &mut W, records: &[RepositoryRecord]) -> io::Result<()> {
    for record in records {
        writeln!(out, "Project: {}", record.full_path.display())?;
        if let Some(info) = &record.info {
            writeln!(out, "Author: {}", info.author)?;
            writeln!(out, "CreatedAt: {}", created_at(info))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write the records as a pretty JSON array
///
/// Failed chunks are not part of the array; they go through
/// [`write_failures`] like in text mode.
pub fn write_json<W: Write>(out: &mut W, records: &[RepositoryRecord]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, records)?;
    writeln!(out)
}

/// Write one line per failed chunk
pub fn write_failures<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    for failure in &report.failures {
        writeln!(
            out,
            "chunk {} ({}) failed: {}",
            failure.chunk,
            failure.names.join(", "),
            failure.error
        )?;
    }
    Ok(())
}

fn created_at(info: &CommitInfo) -> String {
    info.created_at
        .map_or_else(|| UNKNOWN_TIMESTAMP.to_string(), |ts| ts.to_rfc3339())
}
