//! Where generated sitemap documents end up.
//!
//! [`persist::save`] is the one place bytes hit the disk: create or truncate,
//! compress while streaming, then finalize everything before returning.
//! [`StorageBackend`] wraps that (plus directory listing for index scans)
//! behind an async trait so the batching pipeline can be pointed at an
//! in-memory [`MockBackend`](backend::MockBackend) in tests.

pub mod backend;
pub mod error;
mod models;
mod path;
pub mod persist;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
