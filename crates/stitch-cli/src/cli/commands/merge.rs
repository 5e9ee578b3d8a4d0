//! `stitch merge`: assemble already-staged chunks and print the receiver's digest.

use anyhow::{Context, Result};
use stitch_core::config::StitchConfig;

use super::target::{blocking, build_transport, identity};
use crate::cli::TargetArgs;

pub async fn run_merge(
    cfg: &StitchConfig,
    target: &TargetArgs,
    name: &str,
    total: u64,
) -> Result<()> {
    let transport = build_transport(cfg, target, cfg.sender.encoding)?;
    let id = identity(target, name)?;
    let label = id.to_string();
    let digest = blocking(move || {
        transport
            .merge(&id, total)
            .with_context(|| format!("merge {id}"))?;
        transport
            .digest(&id)
            .with_context(|| format!("digest {id}"))
    })
    .await?;

    println!("merged {label} from {total} chunk(s)");
    println!("{digest}  {label}");
    Ok(())
}
