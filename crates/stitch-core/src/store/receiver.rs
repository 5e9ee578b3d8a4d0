use std::path::PathBuf;

use super::{ChunkStore, DigestService, MergeEngine, StoreError};
use crate::identity::FileIdentity;

/// The receiver's operations over one upload root: store, merge and digest.
#[derive(Clone)]
pub struct Receiver {
    store: ChunkStore,
    merger: MergeEngine,
    digests: DigestService,
}

impl Receiver {
    pub fn new(root: impl Into<PathBuf>, max_chunk_bytes: u64) -> Self {
        let store = ChunkStore::new(root, max_chunk_bytes);
        Self {
            merger: MergeEngine::new(store.clone()),
            digests: DigestService::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn write_chunk(
        &self,
        identity: &FileIdentity,
        index: u64,
        total: u64,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        self.store.write_chunk(identity, index, total, bytes)
    }

    pub fn chunk_exists(&self, identity: &FileIdentity, index: u64) -> Result<bool, StoreError> {
        self.store.chunk_exists(identity, index)
    }

    pub fn assembled_exists(&self, identity: &FileIdentity) -> Result<bool, StoreError> {
        self.store.assembled_exists(identity)
    }

    pub fn merge(&self, identity: &FileIdentity, total: u64) -> Result<PathBuf, StoreError> {
        self.merger.merge(identity, total)
    }

    pub fn digest(&self, identity: &FileIdentity) -> Result<String, StoreError> {
        self.digests.compute(identity)
    }
}
