//! File identity: the `(directory, filename)` pair naming one transfer target.
//!
//! The directory is relative to the receiver's upload root and is normalized to
//! `/`-separated components. The filename is a single path component that splits
//! into a base name and an extension (the last `.`-suffix, dot included).

use std::fmt;
use std::path::PathBuf;

use crate::store::naming::CHUNK_NAME_OVERHEAD;

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Longest accepted filename: its chunk artifacts must still fit in NAME_MAX.
pub const MAX_FILENAME_LEN: usize = NAME_MAX - CHUNK_NAME_OVERHEAD;

/// Reasons an identity is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid directory {0:?}: {1}")]
    InvalidDirectory(String, &'static str),
    #[error("invalid filename {0:?}: {1}")]
    InvalidFilename(String, &'static str),
}

/// Logical destination of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    directory: String,
    filename: String,
}

impl FileIdentity {
    /// Validates and normalizes `directory` and `filename`.
    ///
    /// `directory` may be empty (the upload root). Absolute paths, `..` components,
    /// drive prefixes and control characters are rejected.
    pub fn new(directory: &str, filename: &str) -> Result<Self, IdentityError> {
        let directory = normalize_directory(directory)?;
        validate_filename(filename)?;
        Ok(Self {
            directory,
            filename: filename.to_string(),
        })
    }

    /// Normalized relative directory (`/`-separated, empty for the root).
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Filename without its extension (`report.pdf` -> `report`).
    pub fn base_name(&self) -> &str {
        split_file_name(&self.filename).0
    }

    /// Last `.`-suffix including the dot (`report.pdf` -> `.pdf`), or empty.
    pub fn extension(&self) -> &str {
        split_file_name(&self.filename).1
    }

    /// Directory as a relative filesystem path.
    pub fn relative_dir(&self) -> PathBuf {
        self.directory.split('/').filter(|c| !c.is_empty()).collect()
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.directory.is_empty() {
            write!(f, "{}", self.filename)
        } else {
            write!(f, "{}/{}", self.directory, self.filename)
        }
    }
}

/// Splits a filename into `(base, extension)`.
///
/// A leading dot does not start an extension: `.profile` -> (`.profile`, ``).
pub fn split_file_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        None | Some(0) => (name, ""),
        Some(i) => (&name[..i], &name[i..]),
    }
}

fn normalize_directory(directory: &str) -> Result<String, IdentityError> {
    let reject = |why| Err(IdentityError::InvalidDirectory(directory.to_string(), why));

    if directory.chars().any(|c| c == '\0' || c.is_control()) {
        return reject("contains control characters");
    }
    if directory.starts_with('/') || directory.starts_with('\\') {
        return reject("must be relative");
    }
    let bytes = directory.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return reject("must not carry a drive prefix");
    }

    let mut parts = Vec::new();
    for component in directory.split(['/', '\\']) {
        match component {
            "" | "." => continue,
            ".." => return reject("must not contain `..`"),
            c => parts.push(c),
        }
    }
    Ok(parts.join("/"))
}

fn validate_filename(filename: &str) -> Result<(), IdentityError> {
    let reject = |why| Err(IdentityError::InvalidFilename(filename.to_string(), why));

    if filename.is_empty() {
        return reject("empty");
    }
    if filename.len() > MAX_FILENAME_LEN {
        return reject("too long for its chunk names");
    }
    if filename == "." || filename == ".." {
        return reject("reserved name");
    }
    if filename
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control())
    {
        return reject("must be a single path component");
    }
    if filename.ends_with('.') {
        return reject("trailing dot");
    }
    Ok(())
}
