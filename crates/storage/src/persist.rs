//! Writing compressed documents to disk.

use crate::error::{ErrorKind, Result};
use mapgen_compress::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::instrument;

/// Create (or truncate) the file at `path` and stream `data` into it through
/// the `compression` encoder.
///
/// Before returning `Ok`, the encoder is finished (trailer written), the
/// buffered writer is flushed, and the file is synced, so every failure in
/// that chain is reported. On any error the handles are simply dropped;
/// a partially written file is left in place.
///
/// Returns the number of bytes stored on disk.
///
/// # Examples
///
/// ```no_run
/// use mapgen_compress::Compression;
/// use mapgen_storage::persist::save;
/// use std::path::Path;
///
/// let stored = save(Path::new("/var/www/site_1.xml.gz"), b"<urlset/>", Compression::Gzip).unwrap();
/// assert!(stored > 0);
/// ```
#[instrument(skip(data), fields(path = %path.display(), format = %compression, input_size = data.len()))]
pub fn save(path: &Path, data: &[u8], compression: Compression) -> Result<u64> {
    let file = File::create(path).map_err(|e| ErrorKind::from_io(e, path))?;
    let mut encoder = compression.encoder(BufWriter::new(file));
    encoder.write_all(data).map_err(|e| ErrorKind::from_io(e, path))?;
    let buffered = encoder.finish().map_err(ErrorKind::compression)?;
    let file = buffered.into_inner().map_err(|e| ErrorKind::from_io(e.into_error(), path))?;
    file.sync_all().map_err(|e| ErrorKind::from_io(e, path))?;
    let stored = file.metadata().map_err(|e| ErrorKind::from_io(e, path))?.len();
    tracing::debug!(stored, "Document persisted");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_save_gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site_1.xml.gz");
        let stored = save(&path, b"<urlset></urlset>", Compression::Gzip).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(stored, bytes.len() as u64);
        assert_eq!(Compression::from_magic_bytes(&bytes), Compression::Gzip);
        assert_eq!(Compression::Gzip.decompress(&bytes).unwrap(), b"<urlset></urlset>");
    }

    #[test]
    fn test_save_uncompressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site_1.xml");
        save(&path, b"<urlset/>", Compression::None).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"<urlset/>");
    }

    #[test]
    fn test_save_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site_1.xml");
        std::fs::write(&path, "a much longer document that must not survive").unwrap();
        save(&path, b"short", Compression::None).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("site_1.xml.gz");
        let err = save(&path, b"<urlset/>", Compression::Gzip).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if *p == path));
    }
}
