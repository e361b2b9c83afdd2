//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::io::{self, Read, Write};
use tracing::instrument;

const GZIP_LEVEL: GzCompression = GzCompression::new(6);

/// A streaming compressor that owns its inner writer.
///
/// Unlike a boxed [`Write`], the encoder can be explicitly [finished](Self::finish):
/// the trailing compressed block and checksum are written and the inner
/// writer is handed back, so that any error during finalization reaches the
/// caller instead of being swallowed by [`Drop`].
pub enum Encoder<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}
impl<W: Write> Encoder<W> {
    /// Write any trailing data for the format and return the inner writer.
    ///
    /// The inner writer is **not** flushed; that's the caller's job.
    pub fn finish(self) -> Result<W> {
        match self {
            Encoder::Plain(writer) => Ok(writer),
            Encoder::Gzip(encoder) => encoder.finish().or_raise(|| ErrorKind::Encode),
        }
    }
}
impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(writer) => writer.write(buf),
            Encoder::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(writer) => writer.flush(),
            Encoder::Gzip(encoder) => encoder.flush(),
        }
    }
}

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapgen_compress::Compression;
    ///
    /// let data = b"<urlset></urlset>";
    /// let compressed = Compression::Gzip.compress(data).unwrap();
    /// assert_eq!(Compression::from_magic_bytes(&compressed), Compression::Gzip);
    /// ```
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder(Vec::new());
        encoder.write_all(input).or_raise(|| ErrorKind::Encode)?;
        encoder.finish()
    }

    /// Decompress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mapgen_compress::Compression;
    ///
    /// let original = b"<urlset></urlset>";
    /// let compressed = Compression::Gzip.compress(original).unwrap();
    /// assert_ne!(compressed, original);
    /// let decompressed = Compression::Gzip.decompress(&compressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len(), output_size))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let size = self.wrap_reader(input).read_to_end(&mut output).or_raise(|| ErrorKind::Corrupt)?;
        tracing::Span::current().record("output_size", size);
        Ok(output)
    }

    /// Wrap a writer with the appropriate compression layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Write;
    /// use mapgen_compress::Compression;
    ///
    /// let mut encoder = Compression::Gzip.encoder(Vec::new());
    /// encoder.write_all(b"<urlset></urlset>").unwrap();
    /// let compressed = encoder.finish().unwrap();
    /// assert!(!compressed.is_empty());
    /// ```
    pub fn encoder<W: Write>(&self, writer: W) -> Encoder<W> {
        match self {
            Compression::None => Encoder::Plain(writer),
            Compression::Gzip => Encoder::Gzip(GzEncoder::new(writer, GZIP_LEVEL)),
        }
    }

    /// Wrap a reader with the appropriate decompression layer.
    ///
    /// Returns a boxed reader that automatically decompresses data.
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Compression::None => Box::new(reader),
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;
    use std::io::{Cursor, Read, Write};

    const DOCUMENT: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?><urlset><url><loc>/a</loc></url></urlset>"#;

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Gzip)]
    fn test_compress_decompress(#[case] format: Compression) {
        let compressed = format.compress(DOCUMENT).unwrap();
        assert_eq!(format.decompress(&compressed).unwrap(), DOCUMENT);
    }

    #[test]
    fn test_invalid_compressed_data() {
        assert!(Compression::Gzip.decompress(b"this is not gzip").is_err());
    }

    #[test]
    fn test_none_is_passthrough() {
        assert_eq!(Compression::None.compress(DOCUMENT).unwrap(), DOCUMENT);
    }

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Gzip)]
    fn test_encoder_then_reader(#[case] format: Compression) {
        let mut encoder = format.encoder(Vec::new());
        // Several small writes, as a streaming producer would do.
        for chunk in DOCUMENT.chunks(7) {
            encoder.write_all(chunk).unwrap();
        }
        let compressed = encoder.finish().unwrap();
        let mut decompressed = Vec::new();
        format.wrap_reader(Cursor::new(compressed)).read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, DOCUMENT);
    }

    #[test]
    fn test_empty_input() {
        let compressed = Compression::Gzip.compress(b"").unwrap();
        // Even an empty stream has a gzip header and trailer.
        assert!(compressed.len() > 2);
        assert!(Compression::Gzip.decompress(&compressed).unwrap().is_empty());
    }
}
