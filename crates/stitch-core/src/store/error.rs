use std::io;

use crate::identity::IdentityError;

/// Receiver-side failure. Each variant has a stable `code()` used on the wire.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidIdentity(#[from] IdentityError),
    #[error("chunk index {index} out of range (total {total})")]
    IndexOutOfRange { index: u64, total: u64 },
    #[error("invalid chunk total {0}")]
    InvalidTotal(u64),
    #[error("chunk of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("request carries no chunk payload")]
    NoPayload,
    #[error("{0} is being merged, try again later")]
    Busy(String),
    #[error("found {found} of {expected} chunks")]
    Incomplete { found: u64, expected: u64 },
    #[error("{0} not found")]
    NotFound(String),
    /// A path this identity needs is occupied by another identity's artifact.
    #[error("{0} conflicts with an existing entry")]
    Conflict(String),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidIdentity(_) => "INVALID_IDENTITY",
            StoreError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            StoreError::InvalidTotal(_) => "INVALID_TOTAL",
            StoreError::TooLarge { .. } => "TOO_LARGE",
            StoreError::NoPayload => "NO_PAYLOAD",
            StoreError::Busy(_) => "BUSY",
            StoreError::Incomplete { .. } => "INCOMPLETE",
            StoreError::NotFound(_) => "NOT_FOUND",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::Io { .. } => "INTERNAL",
        }
    }
}

/// `with_context` for `io::Result`, producing `StoreError::Io`.
pub(crate) trait IoContext<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T, StoreError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T, StoreError> {
        self.map_err(|source| StoreError::Io {
            context: f(),
            source,
        })
    }
}
