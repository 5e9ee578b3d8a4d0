//! Chunk math and planning.
//!
//! Splits a file into fixed-size, 1-based chunks. All chunks but the last have
//! exactly the configured size; the last may be shorter.

mod plan;
mod size;

pub use plan::{plan_chunks, total_chunks, ChunkDescriptor, ChunkRange};
pub use size::{ChunkSize, ParseChunkSizeError};
