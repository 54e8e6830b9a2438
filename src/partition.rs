// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Work partitioning - split the root's subdirectories into scan chunks

use crate::types::Chunk;
use std::ffi::OsString;
use std::num::NonZeroUsize;

/// Group `names` into consecutive chunks of `chunk_size`.
///
/// Order is preserved within and across chunks. Every chunk except possibly
/// the last holds exactly `chunk_size` names; an empty input yields no chunks.
#[must_use]
pub fn partition(names: &[OsString], chunk_size: NonZeroUsize) -> Vec<Chunk> {
    names
        .chunks(chunk_size.get())
        .enumerate()
        .map(|(index, group)| Chunk {
            index,
            names: group.to_vec(),
        })
        .collect()
}
