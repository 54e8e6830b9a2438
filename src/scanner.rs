// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Repository scanning - walk a subtree and report every marker directory

use crate::error::{Result, ScanError};
use crate::metadata::MetadataExtractor;
use crate::types::{Chunk, RepositoryRecord};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Shared stop signal for the tasks of one run
///
/// Checked between walk entries and before every metadata lookup.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Ask every holder of this flag to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`CancelFlag::cancel`] has been called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }
}

/// Walk `root/relative_name` depth-first and record every repository in it.
///
/// A directory named `marker` marks its parent as a repository root. The walk
/// never enters the marker directory itself but keeps going everywhere else,
/// so repositories nested in the working tree or in sibling branches are each
/// reported. With an `extractor`, each record gets its first-commit metadata.
///
/// Any unreadable entry aborts the walk with a filesystem error.
pub fn scan_subtree(
    root: &Path,
    relative_name: impl AsRef<OsStr>,
    marker: &str,
    extractor: Option<&dyn MetadataExtractor>,
) -> Result<Vec<RepositoryRecord>> {
    walk_subtree(
        root,
        relative_name.as_ref(),
        marker,
        extractor,
        &CancelFlag::default(),
    )
}

fn walk_subtree(
    root: &Path,
    relative_name: &OsStr,
    marker: &str,
    extractor: Option<&dyn MetadataExtractor>,
    cancel: &CancelFlag,
) -> Result<Vec<RepositoryRecord>> {
    let start = root.join(relative_name);
    let name = relative_name.to_string_lossy();
    let mut records = Vec::new();

    let mut walker = WalkDir::new(&start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        cancel.check()?;
        let entry = entry?;

        if !entry.file_type().is_dir() || entry.file_name() != marker {
            continue;
        }
        walker.skip_current_dir();

        let Some(repo_dir) = entry.path().parent() else {
            continue;
        };
        trace!(path = %repo_dir.display(), "found repository");

        let info = match extractor {
            Some(extractor) => {
                cancel.check()?;
                Some(extractor.extract(repo_dir)?)
            }
            None => None,
        };

        records.push(RepositoryRecord {
            full_path: repo_dir.to_path_buf(),
            name: name.clone().into_owned(),
            info,
        });
    }

    Ok(records)
}

/// Scan every name of `chunk` in order, stopping at the first error or
/// as soon as `cancel` is raised
pub fn scan_chunk(
    root: &Path,
    chunk: &Chunk,
    marker: &str,
    extractor: Option<&dyn MetadataExtractor>,
    cancel: &CancelFlag,
) -> Result<Vec<RepositoryRecord>> {
    let mut records = Vec::new();
    for name in &chunk.names {
        records.extend(walk_subtree(root, name, marker, extractor, cancel)?);
    }
    debug!(chunk = chunk.index, found = records.len(), "chunk scanned");
    Ok(records)
}
