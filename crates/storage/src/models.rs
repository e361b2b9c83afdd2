//! Storage models.

use std::path::PathBuf;
use time::OffsetDateTime;

/// File metadata returned by storage backends.
///
/// Index scans use the modification time as the `<lastmod>` of each
/// referenced sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Path relative to the backend root (for a flat output folder, the file name)
    pub path: PathBuf,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), modified }
    }

    /// The final path component as UTF-8, if it is representable.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}
