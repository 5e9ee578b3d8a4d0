//! `stitch serve`: run the receiver until Ctrl-C or SIGTERM.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use stitch_core::config::StitchConfig;
use stitch_core::server;
use stitch_core::store::Receiver;

pub async fn run_serve(
    cfg: &StitchConfig,
    listen: Option<SocketAddr>,
    root: Option<PathBuf>,
    max_chunk_bytes: Option<u64>,
) -> Result<()> {
    let listen = listen.unwrap_or(cfg.receiver.listen);
    let root = match root {
        Some(root) => root,
        None => cfg.receiver.upload_root()?,
    };
    let max_chunk_bytes = max_chunk_bytes.unwrap_or(cfg.receiver.max_chunk_bytes);
    if max_chunk_bytes == 0 {
        anyhow::bail!("--max-chunk-bytes must be positive");
    }

    std::fs::create_dir_all(&root)
        .with_context(|| format!("create upload root {}", root.display()))?;
    let listener = server::bind(listen).await?;
    let addr = listener.local_addr().unwrap_or(listen);
    println!("stitch receiver on http://{} (root {})", addr, root.display());

    let receiver = Receiver::new(root, max_chunk_bytes);
    server::serve(listener, receiver, server::shutdown_signal()).await
}
