//! `stitch probe`: ask the receiver whether a chunk or the assembled file exists.

use anyhow::Result;
use stitch_core::config::StitchConfig;

use super::target::{blocking, build_transport, identity};
use crate::cli::TargetArgs;

pub async fn run_probe(
    cfg: &StitchConfig,
    target: &TargetArgs,
    name: &str,
    chunk: Option<u64>,
) -> Result<()> {
    let transport = build_transport(cfg, target, cfg.sender.encoding)?;
    let id = identity(target, name)?;
    let what = match chunk {
        Some(index) => format!("chunk {index} of {id}"),
        None => id.to_string(),
    };
    let exists = blocking(move || {
        let found = match chunk {
            Some(index) => transport.chunk_exists(&id, index)?,
            None => transport.assembled_exists(&id)?,
        };
        Ok(found)
    })
    .await?;

    if exists {
        println!("{what}: present");
    } else {
        println!("{what}: missing");
    }
    Ok(())
}
