//! Transfer cancellation: cancel tokens and a registry of running transfers.
//!
//! Each orchestrated transfer owns one `CancelToken`; every worker thread, retry
//! sleep and in-flight HTTP request of that transfer observes it. `TransferControl`
//! maps running transfers to their tokens so a caller (e.g. the CLI's Ctrl-C
//! handler) can cancel one or all of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::identity::FileIdentity;

/// Granularity of cancellable sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared, clonable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Sleeps for `duration` unless cancelled first. Returns `false` if the
    /// token was (or became) cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

/// Registry of running transfers keyed by destination identity.
#[derive(Default)]
pub struct TransferControl {
    transfers: RwLock<HashMap<FileIdentity, CancelToken>>,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transfer; returns the token to hand to the orchestrator.
    /// Re-registering an identity replaces (but does not cancel) the old token.
    pub fn register(&self, identity: &FileIdentity) -> CancelToken {
        let token = CancelToken::new();
        self.transfers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.clone(), token.clone());
        token
    }

    /// Unregister a transfer (call when it finishes, success or failure).
    pub fn unregister(&self, identity: &FileIdentity) {
        self.transfers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identity);
    }

    /// Cancel one transfer. Returns `false` if it is not registered.
    pub fn request_cancel(&self, identity: &FileIdentity) -> bool {
        match self
            .transfers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
        {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered transfer; returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let transfers = self.transfers.read().unwrap_or_else(PoisonError::into_inner);
        for token in transfers.values() {
            token.cancel();
        }
        transfers.len()
    }

    pub fn len(&self) -> usize {
        self.transfers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> FileIdentity {
        FileIdentity::new("d", name).unwrap()
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn sleep_completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert!(token.sleep(Duration::from_millis(5)));
    }

    #[test]
    fn sleep_is_interrupted_by_cancel() {
        let token = CancelToken::new();
        let remote = token.clone();
        let started = Instant::now();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });
        assert!(!token.sleep(Duration::from_secs(30)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn registry_cancels_one_or_all() {
        let control = TransferControl::new();
        let a = control.register(&id("a.bin"));
        let b = control.register(&id("b.bin"));
        assert_eq!(control.len(), 2);

        assert!(control.request_cancel(&id("a.bin")));
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!control.request_cancel(&id("missing.bin")));

        assert_eq!(control.cancel_all(), 2);
        assert!(b.is_cancelled());

        control.unregister(&id("a.bin"));
        control.unregister(&id("b.bin"));
        assert!(control.is_empty());
    }
}
