//! On-disk naming of chunk artifacts, staging directories and assembled files.
//!
//! Chunk `i` of `report.pdf` lives at `report/report.<i:016>..pdf.tmp`. The fixed
//! 16-digit index makes a plain name sort equal to index order, so the merge needs
//! no side metadata.

use std::path::{Path, PathBuf};

use crate::identity::FileIdentity;

/// Width of the zero-padded chunk index.
pub const INDEX_WIDTH: usize = 16;

/// Largest index that fits in `INDEX_WIDTH` digits.
pub const MAX_CHUNK_INDEX: u64 = 9_999_999_999_999_999;

const CHUNK_SUFFIX: &str = ".tmp";

/// Bytes a chunk artifact name adds to the filename: `.`, the index, `.` and the suffix.
pub const CHUNK_NAME_OVERHEAD: usize = 1 + INDEX_WIDTH + 1 + CHUNK_SUFFIX.len();
const STAGING_SUFFIX: &str = ".staging";
const PART_SUFFIX: &str = ".part";

/// File name of chunk `index` (`report.0000000000000003..pdf.tmp`).
pub fn chunk_file_name(identity: &FileIdentity, index: u64) -> String {
    format!(
        "{}.{:0width$}.{}{}",
        identity.base_name(),
        index,
        identity.extension(),
        CHUNK_SUFFIX,
        width = INDEX_WIDTH
    )
}

/// Index encoded in `file_name` if it is a chunk artifact of `identity`.
pub fn parse_chunk_index(identity: &FileIdentity, file_name: &str) -> Option<u64> {
    let prefix_len = identity.base_name().len() + 1;
    let suffix = format!(".{}{}", identity.extension(), CHUNK_SUFFIX);
    if file_name.len() != prefix_len + INDEX_WIDTH + suffix.len() {
        return None;
    }
    let rest = file_name
        .strip_prefix(identity.base_name())?
        .strip_prefix('.')?
        .strip_suffix(suffix.as_str())?;
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Name of the staging directory. Extensionless names get a suffix so the
/// directory cannot collide with the assembled file.
pub fn staging_dir_name(identity: &FileIdentity) -> String {
    if identity.extension().is_empty() {
        format!("{}{}", identity.base_name(), STAGING_SUFFIX)
    } else {
        identity.base_name().to_string()
    }
}

/// `<root>/<directory>`.
pub fn target_dir(root: &Path, identity: &FileIdentity) -> PathBuf {
    root.join(identity.relative_dir())
}

pub fn staging_dir(root: &Path, identity: &FileIdentity) -> PathBuf {
    target_dir(root, identity).join(staging_dir_name(identity))
}

pub fn chunk_path(root: &Path, identity: &FileIdentity, index: u64) -> PathBuf {
    staging_dir(root, identity).join(chunk_file_name(identity, index))
}

/// `<root>/<directory>/<base><ext>`.
pub fn assembled_path(root: &Path, identity: &FileIdentity) -> PathBuf {
    target_dir(root, identity).join(identity.filename())
}

/// Temp file the merge assembles into before the final rename.
pub fn part_path(root: &Path, identity: &FileIdentity) -> PathBuf {
    staging_dir(root, identity).join(format!("{}{}", identity.filename(), PART_SUFFIX))
}
