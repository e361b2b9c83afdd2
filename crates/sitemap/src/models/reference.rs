use time::OffsetDateTime;

/// One `<sitemap>` entry of a sitemap index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SitemapRef {
    /// Public URL of the referenced sitemap file
    pub location: String,
    pub last_modified: OffsetDateTime,
}
impl SitemapRef {
    pub fn new(location: impl Into<String>, last_modified: OffsetDateTime) -> Self {
        Self { location: location.into(), last_modified }
    }
}

/// A sitemap index document: the produced sitemap files, in the order they
/// were given or discovered.
///
/// Built in one go (see [`Index::from_names`] and [`Index::scan`]) and not
/// modified afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
    sitemaps: Vec<SitemapRef>,
}
impl Index {
    pub fn new(sitemaps: Vec<SitemapRef>) -> Self {
        Self { sitemaps }
    }

    pub fn sitemaps(&self) -> &[SitemapRef] {
        &self.sitemaps
    }

    pub fn len(&self) -> usize {
        self.sitemaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sitemaps.is_empty()
    }
}
impl FromIterator<SitemapRef> for Index {
    fn from_iter<T: IntoIterator<Item = SitemapRef>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
