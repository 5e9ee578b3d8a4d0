//! Resolving `TargetArgs` into a transport and an identity.

use anyhow::{Context, Result};
use std::sync::Arc;

use stitch_core::config::StitchConfig;
use stitch_core::identity::FileIdentity;
use stitch_core::store::Receiver;
use stitch_core::transport::{ChunkTransport, HttpTransport, LocalTransport, PayloadEncoding};

use crate::cli::TargetArgs;

/// `--local-root` wins; otherwise `--server` or `sender.server_url`.
pub(super) fn build_transport(
    cfg: &StitchConfig,
    target: &TargetArgs,
    encoding: PayloadEncoding,
) -> Result<Arc<dyn ChunkTransport>> {
    if let Some(root) = &target.local_root {
        tracing::debug!(root = %root.display(), "using local receiver");
        let receiver = Receiver::new(root.clone(), cfg.receiver.max_chunk_bytes);
        return Ok(Arc::new(LocalTransport::new(receiver)));
    }
    let url = target
        .server
        .as_deref()
        .unwrap_or(cfg.sender.server_url.as_str());
    let transport = HttpTransport::new(url, encoding)
        .with_context(|| format!("invalid receiver URL {url:?}"))?;
    Ok(Arc::new(transport))
}

pub(super) fn identity(target: &TargetArgs, name: &str) -> Result<FileIdentity> {
    FileIdentity::new(&target.directory, name).context("invalid destination")
}

/// Runs a blocking transport call off the async runtime.
pub(super) async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("transport task join")?
}
