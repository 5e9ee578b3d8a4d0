//! `stitch checksum`: SHA-256 of a local file, in the same form the receiver reports.

use anyhow::Result;
use std::path::Path;
use stitch_core::checksum;

pub async fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
