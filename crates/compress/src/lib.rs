//! Compression for persisted sitemap documents.
//!
//! The sitemaps.org protocol allows sitemap and index files to be served
//! either as plain XML or gzip-compressed. This crate wraps [`flate2`] behind
//! a small [`Compression`] enum, providing:
//!
//! - **Format detection** from file names ([`Compression::from_path`]) or
//!   magic bytes ([`Compression::from_magic_bytes`])
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`])
//! - **Streaming** via [`Compression::encoder`], whose [`Encoder::finish`]
//!   hands back the inner writer so callers can finalize it themselves, and
//!   [`Compression::wrap_reader`] for reading files back.
//!
//! Gzip uses the default level: sitemap batches are written often, and the
//! size difference against the best level is marginal for XML.

mod construct;
pub mod error;
mod ops;
mod util;

pub use crate::ops::Encoder;

/// A supported compression format.
///
/// Defaults to [`Gzip`](Self::Gzip), the format search engines expect for
/// `.xml.gz` sitemaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    None,
    /// Gzip compression (.gz)
    #[default]
    Gzip,
}
