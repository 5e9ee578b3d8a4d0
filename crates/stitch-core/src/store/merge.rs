//! Merge Engine: verifies every chunk is staged, then assembles them in index order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::assembly::AssemblyWriter;
use super::chunk_store::{occupied_by, ChunkStore};
use super::error::{IoContext, StoreError};
use super::naming;
use crate::identity::FileIdentity;

#[derive(Clone)]
pub struct MergeEngine {
    store: ChunkStore,
}

impl MergeEngine {
    pub fn new(store: ChunkStore) -> Self {
        Self { store }
    }

    /// Assemble the `expected` staged chunks of `identity` into the final file.
    ///
    /// Holds the staging location's exclusive lock throughout, so no chunk write
    /// can land between the completeness check and assembly. Only this identity's
    /// artifacts are consumed; siblings sharing the staging directory keep theirs.
    /// Returns the assembled path.
    pub fn merge(&self, identity: &FileIdentity, expected: u64) -> Result<PathBuf, StoreError> {
        if expected == 0 || expected > naming::MAX_CHUNK_INDEX {
            return Err(StoreError::InvalidTotal(expected));
        }
        self.store
            .locks()
            .with_exclusive(identity, || self.merge_locked(identity, expected))
    }

    fn merge_locked(&self, identity: &FileIdentity, expected: u64) -> Result<PathBuf, StoreError> {
        let root = self.store.root();
        let dest = naming::assembled_path(root, identity);
        if occupied_by(&dest, |meta| meta.is_dir())? {
            return Err(StoreError::Conflict(dest.display().to_string()));
        }

        let chunks = self.store.staged_chunks(identity)?;
        let found = chunks.len() as u64;
        let contiguous = chunks
            .iter()
            .enumerate()
            .all(|(pos, (index, _))| *index == pos as u64 + 1);
        if found != expected || !contiguous {
            tracing::debug!(identity = %identity, found, expected, "merge precondition not met");
            return Err(StoreError::Incomplete { found, expected });
        }

        let mut total_bytes = 0u64;
        for (_, path) in &chunks {
            let meta = fs::metadata(path).io_context(|| format!("stat {}", path.display()))?;
            total_bytes += meta.len();
        }

        let part = naming::part_path(root, identity);
        let mut writer =
            AssemblyWriter::create(&part).io_context(|| format!("create {}", part.display()))?;
        writer
            .preallocate(total_bytes)
            .io_context(|| format!("preallocate {}", part.display()))?;

        let mut offset = 0u64;
        for (_, path) in &chunks {
            let data = fs::read(path).io_context(|| format!("read {}", path.display()))?;
            writer
                .write_at(offset, &data)
                .io_context(|| format!("write {}", part.display()))?;
            offset += data.len() as u64;
            fs::remove_file(path).io_context(|| format!("remove {}", path.display()))?;
        }
        writer
            .sync()
            .io_context(|| format!("sync {}", part.display()))?;

        writer
            .finalize(&dest)
            .io_context(|| format!("move into place {}", dest.display()))?;

        remove_staging_if_empty(&naming::staging_dir(root, identity))?;

        tracing::info!(identity = %identity, chunks = expected, bytes = total_bytes, "merged");
        Ok(dest)
    }
}

/// Removes the staging directory once no artifact of any identity is left in it.
fn remove_staging_if_empty(staging: &Path) -> Result<(), StoreError> {
    let mut entries = match fs::read_dir(staging) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).io_context(|| format!("list {}", staging.display())),
    };
    if entries.next().is_some() {
        tracing::debug!(staging = %staging.display(), "staging dir still in use");
        return Ok(());
    }
    fs::remove_dir(staging).io_context(|| format!("remove staging dir {}", staging.display()))
}
