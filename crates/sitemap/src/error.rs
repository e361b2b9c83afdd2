//! Sitemap Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Storage and serialization failures
//! are reported per operation; none of them take the process down.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A sitemap error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sitemap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a sitemap failure.
///
/// ### Caller Errors
/// - [`ErrorKind::Configuration`]
/// - [`ErrorKind::Closed`]
///
/// ### Operational Errors
/// - [`ErrorKind::MalformedDocument`]
/// - [`ErrorKind::WriteFailure`] - the storage error is attached as a child.
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Task`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The batch group could not be created as requested (missing output
    /// folder, unusable name, capacity out of range).
    #[display("invalid configuration: {_0}")]
    Configuration(#[error(not(source))] String),
    /// A document could not be encoded to, or decoded from, sitemap XML.
    #[display("malformed sitemap document")]
    MalformedDocument,
    /// A sitemap or index file could not be persisted.
    #[display("failed to write {}", _0.display())]
    WriteFailure(#[error(not(source))] PathBuf),
    /// Listing the output folder, or reading file metadata, failed.
    #[display("failed to read sitemap folder")]
    Storage,
    /// Records were sent to a batch group that no longer accepts them.
    #[display("batch group is closed")]
    Closed,
    /// A background flush task panicked or was aborted.
    #[display("background flush task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteFailure(_) | Self::Storage)
    }
}
