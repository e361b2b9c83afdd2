//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use mapgen_compress::Compression;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files are stored (compressed, exactly as they would be on disk) in a
/// [`BTreeMap`] behind a [`RwLock`], so listings come back in name order.
/// Writes can be made to fail on demand with [`fail_writes`](Self::fail_writes)
/// to exercise error paths of the batching pipeline.
///
/// # Examples
///
/// ```
/// use mapgen_compress::Compression;
/// use mapgen_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("site_1.xml.gz", b"<urlset/>")]);
/// assert_eq!(backend.list().await?.len(), 1);
///
/// backend.write(Path::new("site_2.xml.gz"), b"<urlset/>".to_vec(), Compression::Gzip).await?;
/// assert_eq!(backend.written(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockBackend {
    storage: RwLock<BTreeMap<PathBuf, (OffsetDateTime, Vec<u8>)>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock backend pre-populated with files, gzip-compressed when
    /// their name says so.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_files<P: AsRef<Path>, D: AsRef<[u8]>>(files: impl IntoIterator<Item = (P, D)>) -> Self {
        let now = OffsetDateTime::now_utc();
        let storage = files
            .into_iter()
            .map(|(path, data)| {
                let path = validate_path(path.as_ref()).expect("valid mock path");
                let stored = Compression::from_path(&path).compress(data.as_ref()).expect("compressible mock data");
                (path, (now, stored))
            })
            .collect();
        Self { storage: RwLock::new(storage), ..Self::default() }
    }

    /// Make every subsequent write fail with [`PermissionDenied`](ErrorKind::PermissionDenied).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn written(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Decompressed contents of a stored file.
    pub async fn contents(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let raw = self.read(path.as_ref()).await?;
        Compression::from_path(path.as_ref()).decompress(&raw).map_err(ErrorKind::compression)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            let storage = self.storage.read().await;
            // Only direct children of the root, like the local backend.
            for (path, (modified, _)) in storage.iter().filter(|(path, _)| path.components().count() == 1) {
                yield Ok(FileInfo::new(path.clone(), *modified));
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        match self.storage.read().await.get(&path) {
            Some((_, data)) => Ok(data.clone()),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }

    async fn write(&self, path: &Path, data: Vec<u8>, compression: Compression) -> Result<u64> {
        let path = validate_path(path)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        let stored = compression.compress(&data).map_err(ErrorKind::compression)?;
        let size = stored.len() as u64;
        self.storage.write().await.insert(path, (OffsetDateTime::now_utc(), stored));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(size)
    }
}
