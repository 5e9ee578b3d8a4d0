//! Sender side: the Transfer Orchestrator and its Chunk Transport Workers.
//!
//! The engine is synchronous: blocking transport calls on OS threads. Async
//! callers go through `run_batch`, which runs each transfer on `spawn_blocking`.

mod batch;
mod error;
mod options;
mod orchestrator;
mod progress;
mod report;
mod source;
mod state;
mod worker;

pub use batch::{run_batch, BatchEntry, BatchOptions, BatchProgress, BatchProgressSender};
pub use error::TransferError;
pub use options::{ParseOptionError, ResumeMode, TransferMode, TransferOptions};
pub use orchestrator::{run_transfer, TransferRequest};
pub use progress::{ChunkOutcome, ProgressEvent, ProgressSender};
pub use report::{TransferOutcome, TransferReport};
pub use source::SourceFile;
pub use state::{Stage, TransferState};
pub use worker::ChunkWorker;
