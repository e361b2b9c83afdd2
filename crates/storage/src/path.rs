//! Path validation for files written below a backend root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path relative to a backend root.
///
/// Ensures the path can't escape the root (no `..` traversal past it),
/// strips `.` components and redundant separators, and rejects null bytes
/// and empty paths.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mapgen_storage::validate_path;
/// assert!(validate_path("site_1.xml.gz").is_ok());
/// assert!(validate_path("blog/site_1.xml.gz").is_ok());
/// assert!(validate_path("../site_1.xml.gz").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(validate_path("./blog//../site_1.xml.gz").unwrap(), Path::new("site_1.xml.gz"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidPath(path.as_ref().to_path_buf());
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}
