//! Chunk range planning.

use crate::identity::FileIdentity;

/// A byte range [start, end) (half-open) of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ChunkRange {
    /// Length of this range in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Range of the 1-based chunk `index` in a file of `file_size` bytes.
    /// Returns `None` when `index` is 0 or past the last chunk.
    pub fn for_index(file_size: u64, chunk_bytes: u64, index: u64) -> Option<ChunkRange> {
        if index == 0 || chunk_bytes == 0 {
            return None;
        }
        let start = (index - 1).checked_mul(chunk_bytes)?;
        if start >= file_size {
            return None;
        }
        let end = start.saturating_add(chunk_bytes).min(file_size);
        Some(ChunkRange { start, end })
    }
}

/// One chunk of one transfer: where it comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub identity: FileIdentity,
    /// 1-based chunk index.
    pub index: u64,
    pub range: ChunkRange,
    pub total_chunks: u64,
}

/// `ceil(file_size / chunk_bytes)`; 0 for an empty file or a zero chunk size.
pub fn total_chunks(file_size: u64, chunk_bytes: u64) -> u64 {
    if chunk_bytes == 0 {
        return 0;
    }
    file_size.div_ceil(chunk_bytes)
}

/// Builds the ordered range plan for a file. Index `i` of the result is chunk `i + 1`.
///
/// Returns an empty vec if `file_size` or `chunk_bytes` is 0.
pub fn plan_chunks(file_size: u64, chunk_bytes: u64) -> Vec<ChunkRange> {
    let count = total_chunks(file_size, chunk_bytes);
    let mut out = Vec::with_capacity(count as usize);
    let mut start = 0u64;
    while start < file_size {
        let end = start.saturating_add(chunk_bytes).min(file_size);
        out.push(ChunkRange { start, end });
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_exact_multiple() {
        let ranges = plan_chunks(1000, 250);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0], ChunkRange { start: 0, end: 250 });
        assert_eq!(ranges[3], ChunkRange { start: 750, end: 1000 });
        assert!(ranges.iter().all(|r| r.len() == 250));
    }

    #[test]
    fn plan_short_last_chunk() {
        let ranges = plan_chunks(10, 4);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0], ChunkRange { start: 0, end: 4 });
        assert_eq!(ranges[1], ChunkRange { start: 4, end: 8 });
        assert_eq!(ranges[2], ChunkRange { start: 8, end: 10 });
    }

    #[test]
    fn plan_empty() {
        assert!(plan_chunks(0, 4).is_empty());
        assert!(plan_chunks(100, 0).is_empty());
        assert_eq!(total_chunks(0, 4), 0);
    }

    #[test]
    fn twenty_five_mib_in_five_mib_chunks() {
        let size = 26_214_400;
        let chunk = 5_242_880;
        assert_eq!(total_chunks(size, chunk), 5);
        let ranges = plan_chunks(size, chunk);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[4].len(), 5_242_880);
        assert_eq!(ranges[4].end, size);
    }

    #[test]
    fn plan_matches_total_and_covers_file() {
        for (size, chunk) in [(1u64, 1u64), (7, 3), (65_536, 65_536), (65_537, 65_536)] {
            let ranges = plan_chunks(size, chunk);
            assert_eq!(ranges.len() as u64, total_chunks(size, chunk));
            assert_eq!(ranges.first().unwrap().start, 0);
            assert_eq!(ranges.last().unwrap().end, size);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
                assert_eq!(pair[0].len(), chunk);
            }
        }
    }

    #[test]
    fn for_index_agrees_with_plan() {
        let ranges = plan_chunks(10, 4);
        for (i, r) in ranges.iter().enumerate() {
            assert_eq!(ChunkRange::for_index(10, 4, i as u64 + 1), Some(*r));
        }
        assert_eq!(ChunkRange::for_index(10, 4, 0), None);
        assert_eq!(ChunkRange::for_index(10, 4, 4), None);
    }
}
