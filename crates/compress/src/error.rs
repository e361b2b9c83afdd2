//! Compression Error Types
//!
//! Errors carry an `exn` location trail; the kind says which direction
//! (encoding a document or decoding a stored file) went wrong.

use derive_more::{Display, Error};

/// A compression error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for compression operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A stored file is not valid for its format (truncated gzip member, bad
    /// checksum). Reading it again won't help.
    #[display("corrupt compressed data")]
    Corrupt,
    /// The name does not match any supported format.
    #[display("unsupported compression: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// Writing through the encoder, or finishing it, failed.
    #[display("failed to encode document")]
    Encode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::UnsupportedFormat("br".to_string()).to_string(), "unsupported compression: br");
        assert_eq!(ErrorKind::Corrupt.to_string(), "corrupt compressed data");
    }

    #[test]
    fn test_only_encoding_is_retryable() {
        assert!(ErrorKind::Encode.is_retryable());
        assert!(!ErrorKind::Corrupt.is_retryable());
        assert!(!ErrorKind::UnsupportedFormat("zstd".to_string()).is_retryable());
    }

    #[test]
    fn test_raise_from_io() {
        let disk_full: std::io::Result<()> = Err(std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"));
        let err = disk_full.or_raise(|| ErrorKind::Encode).unwrap_err();
        assert_eq!(*err, ErrorKind::Encode);
    }
}
