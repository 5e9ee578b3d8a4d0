//! Digest Service: content hash of assembled artifacts.

use std::fs::File;
use std::io;

use super::chunk_store::ChunkStore;
use super::error::{IoContext, StoreError};
use crate::checksum;
use crate::identity::FileIdentity;

#[derive(Clone)]
pub struct DigestService {
    store: ChunkStore,
}

impl DigestService {
    pub fn new(store: ChunkStore) -> Self {
        Self { store }
    }

    /// Lowercase hex SHA-256 of the assembled file for `identity`.
    pub fn compute(&self, identity: &FileIdentity) -> Result<String, StoreError> {
        let path = self.store.assembled_path(identity);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(identity.to_string()))
            }
            Err(e) => return Err(e).io_context(|| format!("open {}", path.display())),
        };
        checksum::sha256_reader(file).io_context(|| format!("read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MergeEngine;

    #[test]
    fn digest_of_merged_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path(), 64);
        let ident = FileIdentity::new("", "hello.txt").unwrap();
        store.write_chunk(&ident, 1, 2, b"hel").unwrap();
        store.write_chunk(&ident, 2, 2, b"lo\n").unwrap();
        MergeEngine::new(store.clone()).merge(&ident, 2).unwrap();

        let digest = DigestService::new(store).compute(&ident).unwrap();
        assert_eq!(
            digest,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path(), 64);
        let ident = FileIdentity::new("", "absent.bin").unwrap();
        assert!(matches!(
            DigestService::new(store).compute(&ident),
            Err(StoreError::NotFound(_))
        ));
    }
}
