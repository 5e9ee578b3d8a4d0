pub mod config;
pub mod logging;

pub mod checksum;
pub mod chunking;
pub mod control;
pub mod identity;
pub mod retry;
pub mod sender;
pub mod server;
pub mod store;
pub mod transport;
