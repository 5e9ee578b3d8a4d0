use std::time::Duration;

use crate::identity::FileIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed {
        local_digest: String,
        remote_digest: String,
    },
    /// Resume found the assembled file already on the receiver.
    AlreadyComplete,
}

/// Result of a finished transfer.
#[derive(Debug, Clone)]
pub struct TransferReport {
    pub identity: FileIdentity,
    pub total_chunks: u64,
    pub uploaded_chunks: u64,
    pub skipped_chunks: u64,
    pub bytes_sent: u64,
    pub elapsed: Duration,
    pub outcome: TransferOutcome,
}

impl TransferReport {
    /// `Some(true)` if both digests agree, `None` when nothing was verified.
    pub fn digests_match(&self) -> Option<bool> {
        match &self.outcome {
            TransferOutcome::Completed {
                local_digest,
                remote_digest,
            } => Some(local_digest.eq_ignore_ascii_case(remote_digest)),
            TransferOutcome::AlreadyComplete => None,
        }
    }
}
