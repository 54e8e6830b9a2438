// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scan coordination - list, partition, fan out one task per chunk, join
//!
//! Every task owns the records it finds. They are merged into the run's
//! result only after the task has been joined, so no collection is ever
//! shared between tasks. The only shared state is a [`CancelFlag`], raised
//! when an aborting run returns early so blocking tasks stop walking.

use crate::config::{FailurePolicy, QueryKind, ScanConfig};
use crate::error::{Result, ScanError};
use crate::metadata::{FormattedLogExtractor, GitLogExtractor, MetadataExtractor};
use crate::partition::partition;
use crate::scanner::{scan_chunk, CancelFlag};
use crate::types::{Chunk, ChunkFailure, RepositoryRecord, ScanReport};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Created, nothing done yet
    Idle,
    /// Reading the root directory
    Listing,
    /// Building chunks
    Partitioning,
    /// Chunk tasks running
    Scanning,
    /// Every task has completed
    Joined,
    /// Report handed back
    Done,
}

/// State of a single run
#[derive(Debug)]
struct ScanState {
    phase: ScanPhase,
    chunks: BTreeMap<usize, Arc<Chunk>>,
    records: Vec<RepositoryRecord>,
    failures: Vec<ChunkFailure>,
}

impl ScanState {
    fn new() -> Self {
        Self {
            phase: ScanPhase::Idle,
            chunks: BTreeMap::new(),
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn advance(&mut self, next: ScanPhase) {
        debug!(from = ?self.phase, to = ?next, "scan phase");
        self.phase = next;
    }
}

/// Runs one scan from listing to joined report
///
/// `run` consumes the coordinator; build a new one for another scan.
pub struct ScanCoordinator {
    config: ScanConfig,
    extractor: Option<Arc<dyn MetadataExtractor>>,
    state: ScanState,
}

impl ScanCoordinator {
    /// Coordinator using the git extractor selected by `config.query`
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        let extractor: Option<Arc<dyn MetadataExtractor>> = match (config.dig, config.query) {
            (false, _) => None,
            (true, QueryKind::Log) => Some(Arc::new(GitLogExtractor)),
            (true, QueryKind::Formatted) => Some(Arc::new(FormattedLogExtractor)),
        };
        Self::with_extractor(config, extractor)
    }

    /// Coordinator with an explicit extractor (`None` disables digging)
    #[must_use]
    pub fn with_extractor(
        config: ScanConfig,
        extractor: Option<Arc<dyn MetadataExtractor>>,
    ) -> Self {
        Self {
            config,
            extractor,
            state: ScanState::new(),
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        self.state.phase
    }

    /// Scan the root and return every repository found
    pub async fn run(mut self) -> Result<ScanReport> {
        let root = absolute(&self.config.root)?;
        info!("Scanning: {}", root.display());

        self.state.advance(ScanPhase::Listing);
        let names = list_subdirectories(&root)?;
        debug!(count = names.len(), "top-level directories");

        self.state.advance(ScanPhase::Partitioning);
        self.state.chunks = partition(&names, self.config.chunk_size)
            .into_iter()
            .map(|chunk| (chunk.index, Arc::new(chunk)))
            .collect();

        self.state.advance(ScanPhase::Scanning);
        let cancel = CancelFlag::default();
        let mut tasks = self.spawn_chunks(&root, &cancel);
        info!(tasks = tasks.len(), "scan tasks started");

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(joined) => joined,
                Err(err) => {
                    cancel.cancel();
                    return Err(err.into());
                }
            };
            match outcome {
                Ok(records) => self.state.records.extend(records),
                Err(err) if self.config.failure_policy == FailurePolicy::Continue => {
                    warn!(chunk = index, error = %err, "chunk failed");
                    let names: Vec<String> = self
                        .state
                        .chunks
                        .get(&index)
                        .map(|chunk| {
                            chunk
                                .names
                                .iter()
                                .map(|name| name.to_string_lossy().into_owned())
                                .collect()
                        })
                        .unwrap_or_default();
                    self.state.failures.push(ChunkFailure {
                        chunk: index,
                        names,
                        error: err.to_string(),
                    });
                }
                Err(err) => {
                    debug!(chunk = index, "stopping remaining chunks");
                    cancel.cancel();
                    return Err(err);
                }
            }
        }
        self.state.advance(ScanPhase::Joined);

        info!(
            found = self.state.records.len(),
            failed = self.state.failures.len(),
            "scan complete"
        );
        self.state.advance(ScanPhase::Done);

        Ok(ScanReport {
            records: self.state.records,
            failures: self.state.failures,
        })
    }

    /// One blocking task per chunk
    fn spawn_chunks(
        &self,
        root: &Path,
        cancel: &CancelFlag,
    ) -> JoinSet<(usize, Result<Vec<RepositoryRecord>>)> {
        let mut tasks = JoinSet::new();
        for chunk in self.state.chunks.values() {
            let chunk = Arc::clone(chunk);
            let root = root.to_path_buf();
            let marker = self.config.marker.clone();
            let extractor = self.extractor.clone();
            let cancel = cancel.clone();

            tasks.spawn_blocking(move || {
                let outcome = scan_chunk(&root, &chunk, &marker, extractor.as_deref(), &cancel);
                (chunk.index, outcome)
            });
        }
        tasks
    }
}

/// Names of the directories directly under `root`, sorted
///
/// Files and symlinks are skipped. Names are kept as the filesystem spells
/// them, UTF-8 or not.
pub fn list_subdirectories(root: &Path) -> Result<Vec<OsString>> {
    let entries = fs::read_dir(root).map_err(|e| ScanError::filesystem(root, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ScanError::filesystem(root, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| ScanError::filesystem(entry.path(), e))?;
        if file_type.is_dir() {
            names.push(entry.file_name());
        }
    }
    names.sort();
    Ok(names)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| ScanError::filesystem(path, e))?;
    Ok(cwd.join(path))
}
