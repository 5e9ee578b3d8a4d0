use std::io;
use std::path::PathBuf;

use crate::retry::RetryFailure;
use crate::transport::TransportError;

/// Why a transfer stopped.
///
/// `context` names the failing step, e.g. `chunk 3/5`, `merge`, `remote digest`.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{context}: receiver size limit exceeded: {message}")]
    SizeExceeded { context: String, message: String },
    #[error("{context}: receiver does not accept the payload: {message}")]
    UnsupportedMedia { context: String, message: String },
    #[error("{context}: rejected by receiver: {message}")]
    Rejected { context: String, message: String },
    #[error("{context}: receiver failed: {message}")]
    ServerFatal { context: String, message: String },
    #[error("merge still incomplete after {attempts} attempt(s): {message}")]
    MergeIncomplete { attempts: u32, message: String },
    #[error("{context}: gave up after {attempts} attempt(s): {message}")]
    RetriesExhausted {
        context: String,
        attempts: u32,
        message: String,
    },
    #[error("transfer cancelled")]
    Cancelled,
    #[error("source file {} is empty", .0.display())]
    EmptySource(PathBuf),
    #[error("source file {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Map the final error of a retried transport call.
    pub fn from_retry(context: impl Into<String>, failure: RetryFailure) -> Self {
        let context = context.into();
        if failure.is_cancelled() {
            return TransferError::Cancelled;
        }
        let message = failure.error.to_string();
        if failure.is_exhausted() {
            return match failure.error {
                TransportError::Incomplete(_) => TransferError::MergeIncomplete {
                    attempts: failure.attempts,
                    message,
                },
                _ => TransferError::RetriesExhausted {
                    context,
                    attempts: failure.attempts,
                    message,
                },
            };
        }
        match failure.error {
            TransportError::TooLarge(_) => TransferError::SizeExceeded { context, message },
            TransportError::UnsupportedPayload(_) => {
                TransferError::UnsupportedMedia { context, message }
            }
            TransportError::IndexOutOfRange(_)
            | TransportError::NoPayload(_)
            | TransportError::BadRequest(_)
            | TransportError::NotFound(_)
            | TransportError::Conflict(_) => TransferError::Rejected { context, message },
            TransportError::Cancelled => TransferError::Cancelled,
            _ => TransferError::ServerFatal { context, message },
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransferError::Source {
            path: path.into(),
            source,
        }
    }
}
