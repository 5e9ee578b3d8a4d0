//! `ChunkTransport` that calls an in-process `Receiver` directly.

use super::{ChunkTransport, TransportError};
use crate::chunking::ChunkDescriptor;
use crate::control::CancelToken;
use crate::identity::FileIdentity;
use crate::store::{Receiver, StoreError};

/// Transfers into a receiver living in this process (local directory target).
#[derive(Clone)]
pub struct LocalTransport {
    receiver: Receiver,
}

impl LocalTransport {
    pub fn new(receiver: Receiver) -> Self {
        Self { receiver }
    }
}

impl From<StoreError> for TransportError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::InvalidIdentity(_) | StoreError::InvalidTotal(_) => {
                TransportError::BadRequest(message)
            }
            StoreError::IndexOutOfRange { .. } => TransportError::IndexOutOfRange(message),
            StoreError::TooLarge { .. } => TransportError::TooLarge(message),
            StoreError::NoPayload => TransportError::NoPayload(message),
            StoreError::Busy(_) => TransportError::Unavailable(message),
            StoreError::Incomplete { .. } => TransportError::Incomplete(message),
            StoreError::NotFound(_) => TransportError::NotFound(message),
            StoreError::Conflict(_) => TransportError::Conflict(message),
            StoreError::Io { .. } => TransportError::Internal(message),
        }
    }
}

impl ChunkTransport for LocalTransport {
    fn upload_chunk(
        &self,
        chunk: &ChunkDescriptor,
        payload: &[u8],
        cancel: &CancelToken,
    ) -> Result<(), TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        self.receiver
            .write_chunk(&chunk.identity, chunk.index, chunk.total_chunks, payload)?;
        Ok(())
    }

    fn chunk_exists(&self, identity: &FileIdentity, index: u64) -> Result<bool, TransportError> {
        Ok(self.receiver.chunk_exists(identity, index)?)
    }

    fn assembled_exists(&self, identity: &FileIdentity) -> Result<bool, TransportError> {
        Ok(self.receiver.assembled_exists(identity)?)
    }

    fn merge(&self, identity: &FileIdentity, total_chunks: u64) -> Result<(), TransportError> {
        self.receiver.merge(identity, total_chunks)?;
        Ok(())
    }

    fn digest(&self, identity: &FileIdentity) -> Result<String, TransportError> {
        Ok(self.receiver.digest(identity)?)
    }
}
