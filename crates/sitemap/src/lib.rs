//! Batching URL records into sitemaps.org sitemap files.
//!
//! Records go into a [`BatchGroup`], which numbers and flushes them in files
//! of at most 50,000 entries (`site_1.xml.gz`, `site_2.xml.gz`, ...) on a
//! background task. Every successful flush is recorded in a [`Registry`];
//! those names, or a scan of the output folder, then become an [`Index`]
//! written with [`create_sitemap_index`].
//!
//! ```no_run
//! use mapgen_compress::Compression;
//! use mapgen_sitemap::{BatchGroup, GroupOptions, Index, Registry, UrlRecord, create_sitemap_index};
//! use std::path::Path;
//!
//! # async fn example() -> mapgen_sitemap::error::Result<()> {
//! let registry = Registry::new();
//! let group = BatchGroup::in_folder("/var/www/sitemaps", "site", registry.clone(), GroupOptions::default())?;
//! group.add(UrlRecord::new("https://example.com/")).await?;
//! group.close().await?;
//!
//! let index = Index::from_names(registry.names(), "https://example.com/sitemaps/");
//! create_sitemap_index(Path::new("/var/www/sitemaps/sitemap_index.xml.gz"), &index, Compression::Gzip).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod group;
mod index;
mod models;
pub mod xml;

pub use crate::group::{Accumulator, BatchGroup, Batch, GroupOptions, MAX_URLSET_SIZE, Registry, UrlSender};
pub use crate::index::create_sitemap_index;
pub use crate::models::{ChangeFrequency, Index, Priority, SitemapRef, UrlRecord, parse_lastmod};
