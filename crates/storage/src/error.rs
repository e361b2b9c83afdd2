//! Storage Error Types
//!
//! Paths are attached to the kinds a caller can act on (fix the folder, fix
//! the permissions); everything else is wrapped as-is.

use derive_more::{Display, Error};
use mapgen_compress::error::{Error as CompressionError, ErrorKind as CompressionErrorKind};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong while reading or writing the output folder.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The output folder, or a file in it, does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The process may not read or write here
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// The output folder is a file
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// Any other I/O failure (disk full, interrupted sync)
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains a NUL byte or escapes the backend root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The backend itself failed, e.g. a blocking write task was lost
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
    /// The document could not be compressed or decompressed
    #[display("compression error: {_0}")]
    Compression(CompressionErrorKind),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}
impl ErrorKind {
    /// Wrap a compression failure, keeping its `Exn` frame as a child.
    #[track_caller]
    pub fn compression(err: CompressionError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Compression(inner))
    }

    /// Classify an I/O error against the path it happened on.
    pub fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }
}
