//! In-memory progress of one orchestrated transfer. Never persisted.

use std::fmt;
use std::time::{Duration, Instant};

use crate::chunking::ChunkRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uploading,
    Merging,
    Verifying,
    Done,
    AlreadyComplete,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::AlreadyComplete | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Uploading => "uploading",
            Stage::Merging => "merging",
            Stage::Verifying => "verifying",
            Stage::Done => "done",
            Stage::AlreadyComplete => "already complete",
            Stage::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TransferState {
    /// 1-based index of the chunk being dispatched (sequential mode).
    pub current_chunk: u64,
    pub uploaded_chunks: u64,
    pub skipped_chunks: u64,
    pub total_chunks: u64,
    /// Byte range of `current_chunk`.
    pub start_byte: u64,
    pub end_byte: u64,
    pub bytes_sent: u64,
    pub file_size: u64,
    pub chunk_bytes: u64,
    pub started_at: Instant,
    pub stage: Stage,
}

impl TransferState {
    pub fn new(file_size: u64, chunk_bytes: u64, total_chunks: u64) -> Self {
        let mut state = Self {
            current_chunk: 1,
            uploaded_chunks: 0,
            skipped_chunks: 0,
            total_chunks,
            start_byte: 0,
            end_byte: 0,
            bytes_sent: 0,
            file_size,
            chunk_bytes,
            started_at: Instant::now(),
            stage: Stage::Uploading,
        };
        state.seek(1);
        state
    }

    /// Point `current_chunk` and the byte range at chunk `index`.
    pub fn seek(&mut self, index: u64) {
        self.current_chunk = index;
        let range = ChunkRange::for_index(self.file_size, self.chunk_bytes, index)
            .unwrap_or(ChunkRange {
                start: self.file_size,
                end: self.file_size,
            });
        self.start_byte = range.start;
        self.end_byte = range.end;
    }

    /// Advance to the next chunk after the current one finished.
    pub fn advance(&mut self) {
        self.seek(self.current_chunk + 1);
    }

    pub fn record_uploaded(&mut self, bytes: u64) {
        self.uploaded_chunks += 1;
        self.bytes_sent += bytes;
    }

    pub fn record_skipped(&mut self) {
        self.skipped_chunks += 1;
    }

    pub fn completed_chunks(&self) -> u64 {
        self.uploaded_chunks + self.skipped_chunks
    }

    /// Every chunk has been uploaded or skipped.
    pub fn upload_done(&self) -> bool {
        self.completed_chunks() >= self.total_chunks
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
