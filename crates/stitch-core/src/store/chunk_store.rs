//! Chunk Store: one file per received chunk, keyed by identity and index.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{IoContext, StoreError};
use super::locks::StagingLocks;
use super::naming;
use crate::identity::FileIdentity;

/// Default per-chunk payload limit (51 MiB).
pub const DEFAULT_MAX_CHUNK_BYTES: u64 = 51 * 1024 * 1024;

/// Receiver-local chunk storage under one upload root. Cheap to clone.
#[derive(Clone)]
pub struct ChunkStore {
    inner: Arc<Inner>,
}

struct Inner {
    root: PathBuf,
    max_chunk_bytes: u64,
    locks: StagingLocks,
}

impl ChunkStore {
    pub fn new(root: impl Into<PathBuf>, max_chunk_bytes: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                max_chunk_bytes,
                locks: StagingLocks::new(),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn max_chunk_bytes(&self) -> u64 {
        self.inner.max_chunk_bytes
    }

    pub(crate) fn locks(&self) -> &StagingLocks {
        &self.inner.locks
    }

    /// Store chunk `index` of `total`. Re-uploads overwrite. Returns the chunk's
    /// file name.
    pub fn write_chunk(
        &self,
        identity: &FileIdentity,
        index: u64,
        total: u64,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        let size = bytes.len() as u64;
        if size > self.inner.max_chunk_bytes {
            return Err(StoreError::TooLarge {
                size,
                limit: self.inner.max_chunk_bytes,
            });
        }
        if index == 0 || index > total || index > naming::MAX_CHUNK_INDEX {
            return Err(StoreError::IndexOutOfRange { index, total });
        }
        if bytes.is_empty() {
            return Err(StoreError::NoPayload);
        }

        self.inner.locks.with_shared(identity, || {
            let staging = naming::staging_dir(self.root(), identity);
            if occupied_by(&staging, |meta| !meta.is_dir())? {
                return Err(StoreError::Conflict(staging.display().to_string()));
            }
            fs::create_dir_all(&staging)
                .io_context(|| format!("create staging dir {}", staging.display()))?;
            let name = naming::chunk_file_name(identity, index);
            let path = staging.join(&name);
            write_synced(&path, bytes).io_context(|| format!("write chunk {}", path.display()))?;
            tracing::debug!(identity = %identity, index, total, bytes = size, "chunk stored");
            Ok(name)
        })
    }

    pub fn chunk_exists(&self, identity: &FileIdentity, index: u64) -> Result<bool, StoreError> {
        if index == 0 || index > naming::MAX_CHUNK_INDEX {
            return Ok(false);
        }
        is_file(&naming::chunk_path(self.root(), identity, index))
    }

    pub fn assembled_exists(&self, identity: &FileIdentity) -> Result<bool, StoreError> {
        is_file(&self.assembled_path(identity))
    }

    pub fn assembled_path(&self, identity: &FileIdentity) -> PathBuf {
        naming::assembled_path(self.root(), identity)
    }

    /// Chunk artifacts currently staged for `identity`, in index order.
    /// A missing staging directory yields an empty list.
    pub fn staged_chunks(&self, identity: &FileIdentity) -> Result<Vec<(u64, PathBuf)>, StoreError> {
        let staging = naming::staging_dir(self.root(), identity);
        let entries = match fs::read_dir(&staging) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).io_context(|| format!("list {}", staging.display()));
            }
        };
        let mut chunks = Vec::new();
        for entry in entries {
            let entry = entry.io_context(|| format!("list {}", staging.display()))?;
            let name = entry.file_name();
            let Some(index) = name
                .to_str()
                .and_then(|n| naming::parse_chunk_index(identity, n))
            else {
                continue;
            };
            chunks.push((index, entry.path()));
        }
        chunks.sort_unstable_by_key(|(index, _)| *index);
        Ok(chunks)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

/// Whether something exists at `path` and matches `pred`. Symlinks are not followed.
pub(crate) fn occupied_by<F>(path: &Path, pred: F) -> Result<bool, StoreError>
where
    F: FnOnce(&fs::Metadata) -> bool,
{
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(pred(&meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).io_context(|| format!("stat {}", path.display())),
    }
}

fn is_file(path: &Path) -> Result<bool, StoreError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).io_context(|| format!("stat {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ChunkStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path(), 16);
        (dir, store)
    }

    fn id() -> FileIdentity {
        FileIdentity::new("in/box", "report.pdf").unwrap()
    }

    #[test]
    fn write_then_probe() {
        let (dir, store) = store();
        let name = store.write_chunk(&id(), 2, 3, b"chunk two").unwrap();
        assert_eq!(name, "report.0000000000000002..pdf.tmp");
        assert!(dir.path().join("in/box/report").join(&name).is_file());
        assert!(store.chunk_exists(&id(), 2).unwrap());
        assert!(!store.chunk_exists(&id(), 1).unwrap());
        assert!(!store.chunk_exists(&id(), 0).unwrap());
        assert!(!store.assembled_exists(&id()).unwrap());
    }

    #[test]
    fn rewrite_overwrites() {
        let (_dir, store) = store();
        store.write_chunk(&id(), 1, 1, b"first version").unwrap();
        store.write_chunk(&id(), 1, 1, b"second").unwrap();
        let staged = store.staged_chunks(&id()).unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(fs::read(&staged[0].1).unwrap(), b"second");
    }

    #[test]
    fn rejects_bad_chunks() {
        let (_dir, store) = store();
        assert!(matches!(
            store.write_chunk(&id(), 4, 3, b"x"),
            Err(StoreError::IndexOutOfRange { index: 4, total: 3 })
        ));
        assert!(matches!(
            store.write_chunk(&id(), 0, 3, b"x"),
            Err(StoreError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            store.write_chunk(&id(), 1, 3, &[0u8; 17]),
            Err(StoreError::TooLarge { size: 17, limit: 16 })
        ));
        assert!(matches!(
            store.write_chunk(&id(), 1, 3, b""),
            Err(StoreError::NoPayload)
        ));
        assert!(store.staged_chunks(&id()).unwrap().is_empty());
    }

    #[test]
    fn staged_chunks_in_index_order_and_filtered() {
        let (dir, store) = store();
        for index in [10u64, 2, 1, 9] {
            store.write_chunk(&id(), index, 10, b"x").unwrap();
        }
        fs::write(dir.path().join("in/box/report/notes.txt"), b"stray").unwrap();
        let indices: Vec<u64> = store
            .staged_chunks(&id())
            .unwrap()
            .into_iter()
            .map(|(i, _)| i)
            .collect();
        assert_eq!(indices, vec![1, 2, 9, 10]);
    }

    #[test]
    fn file_in_the_staging_spot_is_a_conflict() {
        let (dir, store) = store();
        fs::create_dir_all(dir.path().join("in/box")).unwrap();
        fs::write(dir.path().join("in/box/report"), b"assembled extensionless file").unwrap();
        assert!(matches!(
            store.write_chunk(&id(), 1, 2, b"x"),
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(
            fs::read(dir.path().join("in/box/report")).unwrap(),
            b"assembled extensionless file"
        );
    }
}
