//! CLI command handlers (one module per command).

mod checksum;
mod merge;
mod probe;
mod send;
mod serve;
mod target;

pub use checksum::run_checksum;
pub use merge::run_merge;
pub use probe::run_probe;
pub use send::{run_resume, run_send};
#[cfg(test)]
pub(crate) use send::{batch_options, destination_name, transfer_options, transfer_requests};
pub use serve::run_serve;
