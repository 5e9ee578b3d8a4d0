#![allow(dead_code)]

pub mod receiver_server;

use std::path::{Path, PathBuf};
use std::time::Duration;

use stitch_core::retry::RetryPolicy;

/// Retry policy with millisecond backoff so tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(2),
        max_delay: Duration::from_millis(10),
    }
}

/// Deterministic, non-repeating-at-chunk-boundaries test content.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 ^ (i / 251) as u8).collect()
}

/// Write `len` bytes of `pattern` to `dir/name`.
pub fn write_source(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, pattern(len)).unwrap();
    path
}
