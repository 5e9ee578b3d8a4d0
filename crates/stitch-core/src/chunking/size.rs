//! The enumerated set of chunk sizes a sender may pick.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Supported chunk sizes. Serialized with the same labels used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkSize {
    #[serde(rename = "64K")]
    K64,
    #[serde(rename = "128K")]
    K128,
    #[serde(rename = "256K")]
    K256,
    #[serde(rename = "500K")]
    K500,
    #[default]
    #[serde(rename = "1MB")]
    M1,
    #[serde(rename = "2MB")]
    M2,
    #[serde(rename = "5MB")]
    M5,
    #[serde(rename = "10MB")]
    M10,
    #[serde(rename = "20MB")]
    M20,
    #[serde(rename = "50MB")]
    M50,
}

impl ChunkSize {
    pub const ALL: [ChunkSize; 10] = [
        ChunkSize::K64,
        ChunkSize::K128,
        ChunkSize::K256,
        ChunkSize::K500,
        ChunkSize::M1,
        ChunkSize::M2,
        ChunkSize::M5,
        ChunkSize::M10,
        ChunkSize::M20,
        ChunkSize::M50,
    ];

    /// Size in bytes.
    pub fn bytes(self) -> u64 {
        match self {
            ChunkSize::K64 => 64 * KIB,
            ChunkSize::K128 => 128 * KIB,
            ChunkSize::K256 => 256 * KIB,
            ChunkSize::K500 => 500 * KIB,
            ChunkSize::M1 => MIB,
            ChunkSize::M2 => 2 * MIB,
            ChunkSize::M5 => 5 * MIB,
            ChunkSize::M10 => 10 * MIB,
            ChunkSize::M20 => 20 * MIB,
            ChunkSize::M50 => 50 * MIB,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChunkSize::K64 => "64K",
            ChunkSize::K128 => "128K",
            ChunkSize::K256 => "256K",
            ChunkSize::K500 => "500K",
            ChunkSize::M1 => "1MB",
            ChunkSize::M2 => "2MB",
            ChunkSize::M5 => "5MB",
            ChunkSize::M10 => "10MB",
            ChunkSize::M20 => "20MB",
            ChunkSize::M50 => "50MB",
        }
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported chunk size {0:?} (expected one of 64K, 128K, 256K, 500K, 1MB, 2MB, 5MB, 10MB, 20MB, 50MB)")]
pub struct ParseChunkSizeError(pub String);

impl FromStr for ChunkSize {
    type Err = ParseChunkSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChunkSize::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseChunkSizeError(s.to_string()))
    }
}
