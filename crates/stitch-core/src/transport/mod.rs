//! Sender-side view of the receiver: the five receiver operations behind one trait.
//!
//! `HttpTransport` talks to a remote `stitch serve` over HTTP (one curl easy
//! handle per request). `LocalTransport` calls an in-process `Receiver` directly.
//! The orchestrator and workers only see `ChunkTransport`.

mod encoding;
mod http;
mod local;

pub use encoding::{DecodeError, PayloadEncoding, ENCODING_HEADER};
pub use http::HttpTransport;
pub use local::LocalTransport;

use crate::chunking::ChunkDescriptor;
use crate::control::CancelToken;
use crate::identity::FileIdentity;

/// Error returned by a single receiver operation.
///
/// Variants line up with receiver outcomes so `retry::classify` can decide
/// whether the same request is worth repeating.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Receiver asked us to come back later (HTTP 503/429, identity busy merging).
    #[error("receiver unavailable: {0}")]
    Unavailable(String),
    /// Curl reported an error (timeout, connection refused, reset, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("unsupported payload: {0}")]
    UnsupportedPayload(String),
    #[error("chunk too large: {0}")]
    TooLarge(String),
    #[error("chunk index out of range: {0}")]
    IndexOutOfRange(String),
    #[error("no payload: {0}")]
    NoPayload(String),
    /// Malformed request, e.g. an identity the receiver rejects.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Merge precondition failed: not all chunks are staged yet.
    #[error("merge incomplete: {0}")]
    Incomplete(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The destination path is taken by another identity's artifact.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("receiver internal error: {0}")]
    Internal(String),
    #[error("unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u32, body: String },
    #[error("request cancelled")]
    Cancelled,
}

/// The receiver operations, as seen by the sender.
pub trait ChunkTransport: Send + Sync {
    /// Upload one chunk. Success means the receiver stored it (HTTP 201).
    /// Implementations abort promptly once `cancel` is set.
    fn upload_chunk(
        &self,
        chunk: &ChunkDescriptor,
        payload: &[u8],
        cancel: &CancelToken,
    ) -> Result<(), TransportError>;

    /// Does chunk `index` of `identity` already exist on the receiver?
    fn chunk_exists(&self, identity: &FileIdentity, index: u64) -> Result<bool, TransportError>;

    /// Does the assembled file for `identity` already exist?
    fn assembled_exists(&self, identity: &FileIdentity) -> Result<bool, TransportError>;

    /// Ask the receiver to assemble `total_chunks` staged chunks.
    fn merge(&self, identity: &FileIdentity, total_chunks: u64) -> Result<(), TransportError>;

    /// Content digest of the assembled file (lowercase hex SHA-256).
    fn digest(&self, identity: &FileIdentity) -> Result<String, TransportError>;
}
