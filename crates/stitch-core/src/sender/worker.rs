//! Chunk Transport Worker: delivers exactly one chunk.

use std::sync::Arc;

use super::error::TransferError;
use super::progress::ChunkOutcome;
use super::source::SourceFile;
use crate::chunking::ChunkDescriptor;
use crate::control::CancelToken;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::ChunkTransport;

/// Everything a worker thread needs to deliver chunks of one transfer. Cheap to clone.
#[derive(Clone)]
pub struct ChunkWorker {
    transport: Arc<dyn ChunkTransport>,
    source: Arc<SourceFile>,
    policy: RetryPolicy,
    cancel: CancelToken,
    resume: bool,
}

impl ChunkWorker {
    pub fn new(
        transport: Arc<dyn ChunkTransport>,
        source: Arc<SourceFile>,
        policy: RetryPolicy,
        cancel: CancelToken,
        resume: bool,
    ) -> Self {
        Self {
            transport,
            source,
            policy,
            cancel,
            resume,
        }
    }

    /// Probe (when resuming), read and upload one chunk, retrying transient failures.
    pub fn deliver(&self, chunk: &ChunkDescriptor) -> Result<ChunkOutcome, TransferError> {
        if self.cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let context = format!("chunk {}/{}", chunk.index, chunk.total_chunks);

        if self.resume {
            let exists = run_with_retry(&self.policy, &self.cancel, |_| {
                self.transport.chunk_exists(&chunk.identity, chunk.index)
            })
            .map_err(|f| TransferError::from_retry(format!("probe {context}"), f))?;
            if exists {
                tracing::debug!(identity = %chunk.identity, index = chunk.index, "chunk already on receiver");
                return Ok(ChunkOutcome::Skipped);
            }
        }

        let payload = self.source.read_range(chunk.range)?;
        run_with_retry(&self.policy, &self.cancel, |attempt| {
            if attempt > 1 {
                tracing::debug!(identity = %chunk.identity, index = chunk.index, attempt, "re-sending chunk");
            }
            self.transport.upload_chunk(chunk, &payload, &self.cancel)
        })
        .map_err(|f| TransferError::from_retry(context, f))?;

        tracing::debug!(
            identity = %chunk.identity,
            index = chunk.index,
            bytes = payload.len(),
            "chunk uploaded"
        );
        Ok(ChunkOutcome::Uploaded {
            bytes: payload.len() as u64,
        })
    }
}
