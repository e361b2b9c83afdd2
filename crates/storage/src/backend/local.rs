//! Local filesystem storage backend.
//!
//! Files are written to a single existing directory. Listing uses
//! `tokio::fs`; writes run [`persist::save`](crate::persist::save) on the
//! blocking thread pool since the compressor is a sync [`Write`](std::io::Write).

use crate::backend::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::persist;
use crate::{FileInfo, StorageBackend, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use mapgen_compress::Compression;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use mapgen_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("public", "/var/www/sitemaps")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    /// Directory the sitemap files live in
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Unlike a library root, an output folder is never created on demand:
    /// returns [`NotFound`](ErrorKind::NotFound) if `root` does not exist,
    /// [`NotADirectory`](ErrorKind::NotADirectory) if it isn't a directory,
    /// and [`PermissionDenied`](ErrorKind::PermissionDenied) if it cannot be
    /// listed.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        // Use non-async here; it only happens once per batch group and it's
        // not worth making the constructor async.
        let metadata = std::fs::metadata(&root).map_err(|e| ErrorKind::from_io(e, &root))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(root));
        }
        std::fs::read_dir(&root).map_err(|e| ErrorKind::from_io(e, &root))?;
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a relative storage path.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn metadata(path: &Path, metadata: Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(|e| ErrorKind::from_io(e, path))?.into();
        Ok(FileInfo::new(path, modified))
    }

    async fn process_entry(entry: DirEntry) -> Result<Option<FileInfo>> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| ErrorKind::from_io(e, &path))?;
        if !metadata.is_file() {
            // Subdirectories, sockets and the like.
            return Ok(None);
        }
        Self::metadata(Path::new(&entry.file_name()), metadata).map(Some)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            let mut entries = match fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                Err(err) => {
                    yield Err(exn::Exn::from(ErrorKind::from_io(err, &self.root)));
                    return;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        yield Err(exn::Exn::from(ErrorKind::from_io(err, &self.root)));
                        continue;
                    },
                };
                match Self::process_entry(entry).await {
                    Ok(Some(file)) => yield Ok(file),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn write(&self, path: &Path, data: Vec<u8>, compression: Compression) -> Result<u64> {
        let abs_path = self.absolute_path(path)?;
        tokio::task::spawn_blocking(move || persist::save(&abs_path, &data, compression))
            .await
            .map_err(|e| ErrorKind::BackendError(format!("write task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_requires_existing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("out", temp_dir.path()).is_ok());

        let missing = temp_dir.path().join("missing");
        let err = LocalBackend::new("out", &missing).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if *p == missing));
        // Never created as a side effect.
        assert!(!missing.exists());

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "data").unwrap();
        let err = LocalBackend::new("out", &file).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("out", temp_dir.path()).unwrap();
        assert_eq!(backend.absolute_path("site_1.xml.gz").unwrap(), temp_dir.path().join("site_1.xml.gz"));
        assert!(backend.absolute_path("../site_1.xml.gz").is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("out", temp_dir.path()).unwrap();
        let stored = backend.write(Path::new("site_1.xml.gz"), b"<urlset/>".to_vec(), Compression::Gzip).await.unwrap();
        let raw = backend.read(Path::new("site_1.xml.gz")).await.unwrap();
        assert_eq!(stored, raw.len() as u64);
        assert_eq!(Compression::Gzip.decompress(&raw).unwrap(), b"<urlset/>");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("out", temp_dir.path()).unwrap();
        let err = backend.read(Path::new("site_1.xml")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if *p == Path::new("site_1.xml")));
        backend.write(Path::new("site_1.xml"), b"<urlset/>".to_vec(), Compression::None).await.unwrap();
        assert_eq!(backend.read(Path::new("site_1.xml")).await.unwrap(), b"<urlset/>");
    }

    #[tokio::test]
    async fn test_list_is_flat_and_files_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("out", temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path().join("site_1.xml.gz"), "data").unwrap();
        std::fs::write(temp_dir.path().join("robots.txt"), "data").unwrap();
        std::fs::create_dir(temp_dir.path().join("archive")).unwrap();
        std::fs::write(temp_dir.path().join("archive").join("old_1.xml.gz"), "data").unwrap();

        let mut names: Vec<_> = backend.list().await.unwrap().into_iter().map(|f| f.path).collect();
        names.sort();
        assert_eq!(names, vec![PathBuf::from("robots.txt"), PathBuf::from("site_1.xml.gz")]);
    }

    #[tokio::test]
    async fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("out", temp_dir.path()).unwrap();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.write(Path::new("../escape.xml"), b"data".to_vec(), Compression::None).await.is_err());
    }
}
