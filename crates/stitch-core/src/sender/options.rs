use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chunking::ChunkSize;
use crate::retry::RetryPolicy;

/// How chunks are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// One chunk at a time, in index order.
    #[default]
    Sequential,
    /// A fixed pool of workers pulling from a shared queue.
    Parallel,
}

/// Whether (and how) to skip work the receiver already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeMode {
    #[default]
    Off,
    /// Probe before each chunk, dispatching sequentially.
    Normal,
    /// Probe before each chunk, dispatching in parallel.
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} {value:?} (expected {expected})")]
pub struct ParseOptionError {
    what: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for TransferMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(TransferMode::Sequential),
            "parallel" => Ok(TransferMode::Parallel),
            _ => Err(ParseOptionError {
                what: "transfer mode",
                value: s.to_string(),
                expected: "sequential or parallel",
            }),
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferMode::Sequential => "sequential",
            TransferMode::Parallel => "parallel",
        })
    }
}

impl FromStr for ResumeMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(ResumeMode::Off),
            "normal" => Ok(ResumeMode::Normal),
            "parallel" => Ok(ResumeMode::Parallel),
            _ => Err(ParseOptionError {
                what: "resume type",
                value: s.to_string(),
                expected: "off, normal or parallel",
            }),
        }
    }
}

impl fmt::Display for ResumeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResumeMode::Off => "off",
            ResumeMode::Normal => "normal",
            ResumeMode::Parallel => "parallel",
        })
    }
}

/// Per-transfer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub chunk_size: ChunkSize,
    pub mode: TransferMode,
    pub resume: ResumeMode,
    /// Upper bound on concurrent chunk uploads in parallel mode (at least 1).
    pub max_parallel: usize,
    pub retry: RetryPolicy,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            mode: TransferMode::default(),
            resume: ResumeMode::default(),
            max_parallel: 4,
            retry: RetryPolicy::default(),
        }
    }
}

impl TransferOptions {
    /// Dispatch mode actually used: a resume type overrides `mode`.
    pub fn effective_mode(&self) -> TransferMode {
        match self.resume {
            ResumeMode::Off => self.mode,
            ResumeMode::Normal => TransferMode::Sequential,
            ResumeMode::Parallel => TransferMode::Parallel,
        }
    }

    pub fn resuming(&self) -> bool {
        self.resume != ResumeMode::Off
    }
}
