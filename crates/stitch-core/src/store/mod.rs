//! Receiver-side storage and file lifecycle.
//!
//! Chunks are staged as independent files under `<root>/<directory>/<staging>/`,
//! named so that lexicographic order is index order. The merge engine checks that
//! every chunk is present, assembles them into a preallocated `.part` file, and
//! renames it over the final name. Per-identity locks keep merges and chunk
//! writes apart.

mod assembly;
mod chunk_store;
mod digest;
mod error;
mod locks;
mod merge;
pub mod naming;
mod receiver;

pub use assembly::AssemblyWriter;
pub use chunk_store::{ChunkStore, DEFAULT_MAX_CHUNK_BYTES};
pub use digest::DigestService;
pub use error::StoreError;
pub use locks::StagingLocks;
pub use merge::MergeEngine;
pub use receiver::Receiver;
