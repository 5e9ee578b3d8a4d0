//! Reader/writer locks over staging locations.
//!
//! Identities are keyed by `(directory, base name)`: `report.pdf`, `report.doc`
//! and `report` share one staging directory or collide with it, so they share a
//! lock. Chunk writes hold the shared side so distinct indices are written
//! concurrently; a merge holds the exclusive side for its whole
//! check-then-assemble sequence. Writers never wait: a write that finds a merge
//! in progress fails with `Busy`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};

use super::error::StoreError;
use crate::identity::FileIdentity;

type StagingKey = (String, String);

fn staging_key(identity: &FileIdentity) -> StagingKey {
    (
        identity.directory().to_string(),
        identity.base_name().to_string(),
    )
}

#[derive(Default)]
pub struct StagingLocks {
    locks: Mutex<HashMap<StagingKey, Arc<RwLock<()>>>>,
}

impl StagingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` under the shared lock, or fail with `Busy` if a merge holds it.
    pub fn with_shared<T, F>(&self, identity: &FileIdentity, f: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Result<T, StoreError>,
    {
        let key = staging_key(identity);
        let lock = self.entry(&key);
        let result = match lock.try_read() {
            Ok(_guard) => f(),
            Err(TryLockError::Poisoned(poisoned)) => {
                let _guard = poisoned.into_inner();
                f()
            }
            Err(TryLockError::WouldBlock) => Err(StoreError::Busy(identity.to_string())),
        };
        self.release(&key, lock);
        result
    }

    /// Run `f` under the exclusive lock, waiting for in-flight writes to finish.
    pub fn with_exclusive<T, F>(&self, identity: &FileIdentity, f: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Result<T, StoreError>,
    {
        let key = staging_key(identity);
        let lock = self.entry(&key);
        let result = {
            let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(&key, lock);
        result
    }

    /// Number of staging locations with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &StagingKey) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Drop our handle and forget the entry once nobody else holds one.
    fn release(&self, key: &StagingKey, lock: Arc<RwLock<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks
            .get(key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn id(name: &str) -> FileIdentity {
        FileIdentity::new("", name).unwrap()
    }

    #[test]
    fn shared_holders_do_not_block_each_other() {
        let locks = StagingLocks::new();
        let ident = id("a.bin");
        let out = locks
            .with_shared(&ident, || locks.with_shared(&ident, || Ok(7)))
            .unwrap();
        assert_eq!(out, 7);
        assert!(locks.is_empty());
    }

    #[test]
    fn write_during_merge_is_busy() {
        let locks = Arc::new(StagingLocks::new());
        let ident = id("a.bin");
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let merger = {
            let locks = Arc::clone(&locks);
            let ident = ident.clone();
            std::thread::spawn(move || {
                locks.with_exclusive(&ident, || {
                    entered_tx.send(()).unwrap();
                    release_rx.recv_timeout(Duration::from_secs(10)).unwrap();
                    Ok(())
                })
            })
        };

        entered_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let err = locks.with_shared(&ident, || Ok(())).unwrap_err();
        assert!(matches!(err, StoreError::Busy(_)));
        // Same base name, same staging location.
        assert!(matches!(
            locks.with_shared(&id("a.txt"), || Ok(())),
            Err(StoreError::Busy(_))
        ));
        // Other base names are unaffected.
        locks.with_shared(&id("b.bin"), || Ok(())).unwrap();

        release_tx.send(()).unwrap();
        merger.join().unwrap().unwrap();
        locks.with_shared(&ident, || Ok(())).unwrap();
        assert!(locks.is_empty());
    }
}
