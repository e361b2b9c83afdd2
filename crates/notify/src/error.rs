//! Notifier Error Types
//!
//! Every ping is reported on its own; a failure here never stops the other
//! pings, and callers usually just log it.

use derive_more::{Display, Error};

/// A notifier error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The endpoint is not an absolute URL that a query can be added to.
    #[display("invalid ping endpoint: {_0}")]
    InvalidEndpoint(#[error(not(source))] String),
    /// The HTTP client could not be built.
    #[display("failed to build HTTP client")]
    Client,
    /// The request failed before a response arrived (DNS, connect, timeout).
    #[display("ping request failed")]
    Network,
    /// The task sending a ping panicked.
    #[display("ping task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(!ErrorKind::InvalidEndpoint("ftp:".into()).is_retryable());
        assert!(!ErrorKind::Task.is_retryable());
    }
}
