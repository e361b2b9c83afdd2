//! Tab-separated URL records, as read by `generate` and printed by `inspect`.
//!
//! `location [TAB lastmod [TAB changefreq [TAB priority]]]`, where an empty
//! column means "not set".

use mapgen_sitemap::{SitemapRef, UrlRecord, parse_lastmod};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Parse one input line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_record(line: &str) -> Result<Option<UrlRecord>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_start().starts_with('#') {
        return Ok(None);
    }
    let mut columns = line.split('\t').map(str::trim);
    let location = columns.next().unwrap_or_default();
    if location.is_empty() {
        return Err("missing location".to_string());
    }

    let mut record = UrlRecord::new(location);
    if let Some(value) = columns.next().filter(|v| !v.is_empty()) {
        let last_modified = parse_lastmod(value).ok_or_else(|| format!("invalid lastmod: {value}"))?;
        record = record.with_last_modified(last_modified);
    }
    if let Some(value) = columns.next().filter(|v| !v.is_empty()) {
        record = record.with_change_frequency(value.parse()?);
    }
    if let Some(value) = columns.next().filter(|v| !v.is_empty()) {
        record = record.with_priority(value.parse()?);
    }
    if columns.next().is_some() {
        return Err("too many columns".to_string());
    }
    Ok(Some(record))
}

/// The inverse of [`parse_record`], without trailing empty columns.
pub fn format_record(record: &UrlRecord) -> String {
    let columns = [
        record.location().to_string(),
        record.last_modified().map(format_timestamp).unwrap_or_default(),
        record.change_frequency().map(|f| f.to_string()).unwrap_or_default(),
        record.priority().map(|p| p.to_string()).unwrap_or_default(),
    ];
    columns.join("\t").trim_end_matches('\t').to_string()
}

pub fn format_sitemap(sitemap: &SitemapRef) -> String {
    format!("{}\t{}", sitemap.location, format_timestamp(sitemap.last_modified))
}

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_else(|_| timestamp.to_string())
}
