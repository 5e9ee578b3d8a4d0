//! CLI for stitch.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use stitch_core::chunking::ChunkSize;
use stitch_core::config::{self, StitchConfig};
use stitch_core::sender::{ResumeMode, TransferMode};
use stitch_core::transport::PayloadEncoding;

use commands::{run_checksum, run_merge, run_probe, run_resume, run_send, run_serve};

/// Top-level CLI for stitch.
#[derive(Debug, Parser)]
#[command(name = "stitch")]
#[command(about = "stitch: resumable chunked file transfer", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/stitch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Where a command talks to: a remote receiver or a local upload root.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Destination directory, relative to the receiver's upload root.
    #[arg(long, short = 'd', default_value = "", value_name = "DIR")]
    pub directory: String,

    /// Receiver base URL (default: sender.server_url from config).
    #[arg(long, value_name = "URL", conflicts_with = "local_root")]
    pub server: Option<String>,

    /// Use a local upload root in-process instead of a remote receiver.
    #[arg(long, value_name = "DIR")]
    pub local_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct SendArgs {
    /// Files to send; they run concurrently, up to --max-files at a time.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Destination file name (default: the source's file name). Single file only.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Chunk size: 64K, 128K, 256K, 500K, 1MB, 2MB, 5MB, 10MB, 20MB or 50MB.
    #[arg(long, value_name = "SIZE")]
    pub chunk_size: Option<ChunkSize>,

    /// Upload up to P chunks concurrently (implies --mode parallel unless set).
    #[arg(long, value_name = "P")]
    pub parallel: Option<usize>,

    /// Dispatch mode: sequential or parallel.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<TransferMode>,

    /// Chunk body encoding: raw or base64.
    #[arg(long, value_name = "ENCODING")]
    pub encoding: Option<PayloadEncoding>,

    /// Files sent at once (default: sender.max_files from config).
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Keep the other files going when one fails.
    #[arg(long)]
    pub keep_going: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the receiver until Ctrl-C.
    Serve {
        /// Address to listen on (default: receiver.listen from config).
        #[arg(long, value_name = "ADDR")]
        listen: Option<SocketAddr>,
        /// Upload root directory (default: receiver.upload_root from config).
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
        /// Largest accepted chunk in bytes.
        #[arg(long, value_name = "BYTES")]
        max_chunk_bytes: Option<u64>,
    },

    /// Send files in chunks, then merge and verify each on the receiver.
    Send {
        #[command(flatten)]
        args: SendArgs,
    },

    /// Like send, but skip chunks (or the whole file) the receiver already has.
    Resume {
        #[command(flatten)]
        args: SendArgs,
        /// normal (sequential) or parallel.
        #[arg(long, default_value = "normal", value_name = "TYPE")]
        resume_type: ResumeMode,
    },

    /// Check whether the receiver has a chunk, or the assembled file.
    Probe {
        /// Destination file name.
        name: String,
        /// Probe this chunk index instead of the assembled file.
        #[arg(long, value_name = "INDEX")]
        chunk: Option<u64>,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Ask the receiver to assemble staged chunks.
    Merge {
        /// Destination file name.
        name: String,
        /// Expected number of chunks.
        #[arg(long, value_name = "N")]
        total: u64,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Compute SHA-256 of a local file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<StitchConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve {
                listen,
                root,
                max_chunk_bytes,
            } => run_serve(&cfg, listen, root, max_chunk_bytes).await?,
            CliCommand::Send { args } => run_send(&cfg, &args).await?,
            CliCommand::Resume { args, resume_type } => {
                run_resume(&cfg, &args, resume_type).await?
            }
            CliCommand::Probe {
                name,
                chunk,
                target,
            } => run_probe(&cfg, &target, &name, chunk).await?,
            CliCommand::Merge {
                name,
                total,
                target,
            } => run_merge(&cfg, &target, &name, total).await?,
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
