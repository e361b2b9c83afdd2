//! Building and writing sitemap index documents.

use crate::error::{ErrorKind, Result};
use crate::models::{Index, SitemapRef};
use crate::xml;
use exn::ResultExt;
use mapgen_compress::Compression;
use mapgen_storage::StorageBackend;
use mapgen_storage::persist;
use std::path::Path;
use time::OffsetDateTime;
use tracing::instrument;

impl Index {
    /// Reference each named file, stamped with the current time.
    ///
    /// Locations are `public_url` and the name concatenated as-is, so
    /// `public_url` should normally end with `/`. Order is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapgen_sitemap::Index;
    ///
    /// let index = Index::from_names(["site_1.xml.gz", "site_2.xml.gz"], "https://example.com/");
    /// assert_eq!(index.sitemaps()[1].location, "https://example.com/site_2.xml.gz");
    /// ```
    pub fn from_names<I, S>(names: I, public_url: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names_at(names, public_url, OffsetDateTime::now_utc())
    }

    /// Like [`from_names`](Self::from_names), with every entry stamped with
    /// `last_modified`.
    pub fn from_names_at<I, S>(names: I, public_url: &str, last_modified: OffsetDateTime) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| SitemapRef::new(format!("{public_url}{}", name.as_ref()), last_modified))
            .collect()
    }

    /// Reference every sitemap file found directly in `backend`, using each
    /// file's modification time.
    ///
    /// A file is included when its name ends with the sitemap suffix for
    /// `compression` (`.xml.gz` or `.xml`) and `index_file_name` does *not*
    /// end with that name. The second check keeps the index from listing
    /// itself, but it is a suffix match on names: with an index named
    /// `sitemap_index.xml.gz`, a batch file called `index.xml.gz` is skipped
    /// too. Entries come in listing order.
    ///
    /// # Errors
    ///
    /// [`Storage`](ErrorKind::Storage) if the folder cannot be listed.
    #[instrument(skip(backend), fields(backend = backend.name()))]
    pub async fn scan(
        backend: &dyn StorageBackend,
        index_file_name: &str,
        public_url: &str,
        compression: Compression,
    ) -> Result<Self> {
        let suffix = compression.xml_suffix();
        let files = backend.list().await.or_raise(|| ErrorKind::Storage)?;
        let index: Self = files
            .iter()
            .filter_map(|file| Some((file.file_name()?, file.modified)))
            .filter(|(name, _)| name.ends_with(suffix) && !index_file_name.ends_with(name))
            .map(|(name, modified)| SitemapRef::new(format!("{public_url}{name}"), modified))
            .collect();
        tracing::debug!(listed = files.len(), sitemaps = index.len(), "Scanned sitemap folder");
        Ok(index)
    }
}

/// Serialize `index` and persist it at `path`, compressed with `compression`.
///
/// Returns the number of bytes stored.
///
/// # Errors
///
/// [`MalformedDocument`](ErrorKind::MalformedDocument) if a location cannot
/// be encoded, [`WriteFailure`](ErrorKind::WriteFailure) if the file cannot
/// be written.
#[instrument(skip(index), fields(path = %path.display(), sitemaps = index.len()))]
pub async fn create_sitemap_index(path: &Path, index: &Index, compression: Compression) -> Result<u64> {
    let document = xml::encode_index(index)?;
    let target = path.to_path_buf();
    let stored = tokio::task::spawn_blocking(move || persist::save(&target, &document, compression))
        .await
        .or_raise(|| ErrorKind::Task)?
        .or_raise(|| ErrorKind::WriteFailure(path.to_path_buf()))?;
    tracing::info!(path = %path.display(), sitemaps = index.len(), bytes = stored, "Wrote sitemap index");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapgen_storage::backend::{LocalBackend, MockBackend};

    fn timestamp() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_709_296_200).unwrap()
    }

    #[test]
    fn test_from_names_keeps_order() {
        let index = Index::from_names_at(["b.xml.gz", "a.xml.gz", "c.xml.gz"], "https://example.com/", timestamp());
        let locations: Vec<_> = index.sitemaps().iter().map(|s| s.location.as_str()).collect();
        assert_eq!(
            locations,
            vec!["https://example.com/b.xml.gz", "https://example.com/a.xml.gz", "https://example.com/c.xml.gz"]
        );
        assert!(index.sitemaps().iter().all(|s| s.last_modified == timestamp()));
    }

    #[test]
    fn test_from_names_uses_build_time() {
        let before = OffsetDateTime::now_utc();
        let index = Index::from_names(vec!["site_1.xml.gz".to_string()], "/");
        assert!(index.sitemaps()[0].last_modified >= before);
    }

    #[test]
    fn test_from_no_names() {
        assert!(Index::from_names(Vec::<String>::new(), "/").is_empty());
    }

    #[tokio::test]
    async fn test_scan_filters_by_suffix_and_index_name() {
        let backend = MockBackend::with_files([
            ("site_1.xml.gz", "x"),
            ("site_2.xml.gz", "x"),
            ("sitemap_index.xml.gz", "x"),
            ("robots.txt", "x"),
            ("plain.xml", "x"),
            ("nested/site_3.xml.gz", "x"),
        ]);
        let index = Index::scan(&backend, "sitemap_index.xml.gz", "https://example.com/", Compression::Gzip)
            .await
            .unwrap();
        let mut locations: Vec<_> = index.sitemaps().iter().map(|s| s.location.clone()).collect();
        locations.sort();
        assert_eq!(locations, vec!["https://example.com/site_1.xml.gz", "https://example.com/site_2.xml.gz"]);
    }

    #[tokio::test]
    async fn test_scan_suffix_heuristic_is_imprecise() {
        let backend = MockBackend::with_files([("index.xml.gz", "x"), ("site_1.xml.gz", "x")]);
        let index = Index::scan(&backend, "sitemap_index.xml.gz", "/", Compression::Gzip).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.sitemaps()[0].location, "/site_1.xml.gz");
    }

    #[tokio::test]
    async fn test_scan_uses_file_modification_time() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("site_1.xml"), "<urlset/>").unwrap();
        let modified: OffsetDateTime =
            std::fs::metadata(temp_dir.path().join("site_1.xml")).unwrap().modified().unwrap().into();

        let backend = LocalBackend::new("out", temp_dir.path()).unwrap();
        let index = Index::scan(&backend, "index.xml", "/", Compression::None).await.unwrap();
        assert_eq!(index.sitemaps(), &[SitemapRef::new("/site_1.xml", modified)]);
    }

    #[tokio::test]
    async fn test_create_sitemap_index() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sitemap_index.xml.gz");
        let index = Index::from_names_at(["site_1.xml.gz"], "https://example.com/", timestamp());

        let stored = create_sitemap_index(&path, &index, Compression::Gzip).await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(stored, bytes.len() as u64);
        let decoded = xml::decode_index(&Compression::Gzip.decompress(&bytes).unwrap()).unwrap();
        assert_eq!(decoded, index);
    }

    #[tokio::test]
    async fn test_create_sitemap_index_write_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing").join("sitemap_index.xml.gz");
        let err = create_sitemap_index(&path, &Index::default(), Compression::Gzip).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::WriteFailure(p) if *p == path));
    }
}
