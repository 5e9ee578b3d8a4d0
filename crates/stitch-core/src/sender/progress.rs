//! Progress events. Pass-through only: nothing in the engine waits on them.

use super::state::Stage;

/// Channel the orchestrator publishes progress on. Sends never block; events
/// are dropped while the channel is full.
pub type ProgressSender = tokio::sync::mpsc::Sender<ProgressEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Uploaded { bytes: u64 },
    /// Receiver already had the chunk (resume).
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Stage(Stage),
    Chunk {
        index: u64,
        outcome: ChunkOutcome,
        completed_chunks: u64,
        total_chunks: u64,
        bytes_sent: u64,
        file_size: u64,
    },
}

impl ProgressEvent {
    /// Chunk-count based completion in percent, for `Chunk` events.
    pub fn percent(&self) -> Option<f64> {
        match self {
            ProgressEvent::Chunk {
                completed_chunks,
                total_chunks,
                ..
            } if *total_chunks > 0 => Some(*completed_chunks as f64 * 100.0 / *total_chunks as f64),
            _ => None,
        }
    }
}

pub(crate) fn emit(progress: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(tx) = progress {
        let _ = tx.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_counts_chunks() {
        let ev = ProgressEvent::Chunk {
            index: 2,
            outcome: ChunkOutcome::Skipped,
            completed_chunks: 1,
            total_chunks: 4,
            bytes_sent: 0,
            file_size: 100,
        };
        assert_eq!(ev.percent(), Some(25.0));
        assert_eq!(ProgressEvent::Stage(Stage::Merging).percent(), None);
    }
}
