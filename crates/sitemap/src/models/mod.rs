//! The values that end up inside sitemap documents.

mod record;
mod reference;

pub use self::record::{ChangeFrequency, Priority, UrlRecord, parse_lastmod};
pub use self::reference::{Index, SitemapRef};
