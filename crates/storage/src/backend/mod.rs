//! Storage backend trait and implementations.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use mapgen_compress::Compression;
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for the folder that sitemap files are written to.
///
/// All paths are relative to the backend root and are validated with
/// [`validate_path`](crate::validate_path) by implementations.
///
/// # Examples
///
/// ```
/// use mapgen_compress::Compression;
/// use mapgen_storage::{StorageBackend, error::Result};
/// use std::path::Path;
///
/// async fn write_empty_urlset(backend: &dyn StorageBackend) -> Result<u64> {
///     let document = br#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#;
///     backend.write(Path::new("empty_1.xml.gz"), document.to_vec(), Compression::Gzip).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// List the files directly inside the backend root.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`]. Order is whatever the backend's listing produces;
    /// callers must not rely on it being sorted.
    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream metadata for the files directly inside the backend root.
    ///
    /// Subdirectories are not descended into, and entries that are not
    /// regular files are skipped.
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Read the raw (still compressed) contents of a file.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Persist `data` at `path`, compressed with `compression`.
    ///
    /// Creates or truncates the file. The write is complete (encoder
    /// finished, file flushed) when this returns `Ok`, which yields the
    /// number of bytes stored.
    async fn write(&self, path: &Path, data: Vec<u8>, compression: Compression) -> Result<u64>;
}
