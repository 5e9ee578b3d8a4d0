//! Retry loop: run a closure until success, a permanent error, exhaustion or cancel.

use super::classify;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};
use crate::control::CancelToken;
use crate::transport::TransportError;

/// Final error of a retried operation.
#[derive(Debug, thiserror::Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryFailure {
    #[source]
    pub error: TransportError,
    /// Attempts made, including the failing one.
    pub attempts: u32,
    /// Classification of `error`.
    pub kind: ErrorKind,
}

impl RetryFailure {
    /// The last error was retryable but the policy ran out of attempts.
    pub fn is_exhausted(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, TransportError::Cancelled)
    }
}

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// `f` receives the 1-based attempt number. On a retryable failure the loop sleeps
/// for the backoff delay; the sleep ends early (with `TransportError::Cancelled`)
/// once `cancel` is set.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    mut f: F,
) -> Result<T, RetryFailure>
where
    F: FnMut(u32) -> Result<T, TransportError>,
{
    let mut attempt = 1u32;
    loop {
        if cancel.is_cancelled() {
            return Err(cancelled(attempt.saturating_sub(1)));
        }
        let error = match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        let kind = classify::classify(&error);
        match policy.decide(attempt, kind) {
            RetryDecision::NoRetry => {
                return Err(RetryFailure {
                    error,
                    attempts: attempt,
                    kind,
                })
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    kind = ?kind,
                    error = %error,
                    "transient failure, retrying"
                );
                if !cancel.sleep(delay) {
                    return Err(cancelled(attempt));
                }
                attempt += 1;
            }
        }
    }
}

fn cancelled(attempts: u32) -> RetryFailure {
    RetryFailure {
        error: TransportError::Cancelled,
        attempts,
        kind: ErrorKind::Other,
    }
}
