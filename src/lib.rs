// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repofinder library - find the repositories living under a directory
//!
//! The pipeline lists the immediate subdirectories of a root, partitions them
//! into fixed-size chunks, walks every chunk concurrently looking for marker
//! directories (`.git`) and optionally asks git for each repository's first
//! commit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod metadata;
pub mod partition;
pub mod render;
pub mod scanner;

/// Core data types shared by every stage of the scan
pub mod types {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Serialize};
    use std::ffi::OsString;
    use std::path::PathBuf;

    // =========================================================================
    // Partitioning
    // =========================================================================

    /// An ordered group of root-relative directory names scanned by one task
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Chunk {
        /// Position of this chunk in the partition
        pub index: usize,
        /// Directory names, in listing order, exactly as the filesystem spells them
        pub names: Vec<OsString>,
    }

    impl Chunk {
        /// Number of names in the chunk
        #[must_use]
        pub fn len(&self) -> usize {
            self.names.len()
        }

        /// True if the chunk holds no names
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.names.is_empty()
        }
    }

    // =========================================================================
    // Discovery results
    // =========================================================================

    /// Earliest-commit metadata for a repository
    ///
    /// Both fields are best effort: an author that could not be located is the
    /// empty string and an unparseable date is `None`.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CommitInfo {
        /// Author display string, e.g. `Jane Doe <jane@example.com>`
        pub author: String,
        /// Creation timestamp of the first commit
        pub created_at: Option<DateTime<FixedOffset>>,
    }

    /// A repository found during the walk
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RepositoryRecord {
        /// Path of the directory holding the marker
        pub full_path: PathBuf,
        /// Top-level directory (relative to the scan root) it was found under
        pub name: String,
        /// First-commit metadata, present only when digging
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub info: Option<CommitInfo>,
    }

    /// A chunk that failed while the run kept going
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChunkFailure {
        /// Index of the failed chunk
        pub chunk: usize,
        /// Names the chunk was responsible for, converted for display
        pub names: Vec<String>,
        /// Rendered error
        pub error: String,
    }

    /// Everything a finished run produced
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ScanReport {
        /// Discovered repositories
        pub records: Vec<RepositoryRecord>,
        /// Chunks that failed (only populated when continuing past failures)
        #[serde(default)]
        pub failures: Vec<ChunkFailure>,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{FailurePolicy, QueryKind, ScanConfig, ScanOptions};
    pub use crate::coordinator::ScanCoordinator;
    pub use crate::error::{Result, ScanError};
    pub use crate::metadata::MetadataExtractor;
    pub use crate::types::*;
}
