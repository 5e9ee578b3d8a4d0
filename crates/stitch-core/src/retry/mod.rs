//! Retry and backoff policy.
//!
//! Error classification (timeouts, throttling, connection failures, incomplete
//! merges) and bounded exponential backoff, shared by the chunk worker and the
//! merge step of the completion pipeline.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryFailure};
