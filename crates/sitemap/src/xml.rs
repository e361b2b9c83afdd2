//! Sitemap XML encoding and decoding.
//!
//! Encoding is pure: records in, UTF-8 bytes out. Compression and I/O happen
//! in [`mapgen_storage`]. The decoders exist so that persisted documents can
//! be checked and inspected; they accept any document following the
//! sitemaps.org shape and ignore elements they don't know.

use crate::error::{ErrorKind, Result};
use crate::models::{ChangeFrequency, Index, Priority, SitemapRef, UrlRecord, parse_lastmod};
use exn::{OptionExt, ResultExt};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use time::{OffsetDateTime, UtcOffset};
use time::format_description::well_known::Rfc3339;
use tracing::instrument;

/// XML namespace declared on `<urlset>` and `<sitemapindex>`.
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Encode URL records as a `<urlset>` document, in the order given.
///
/// # Errors
///
/// [`MalformedDocument`](ErrorKind::MalformedDocument) if any value contains
/// characters that XML 1.0 cannot carry (NUL and most other control
/// characters), or if a timestamp cannot be formatted.
///
/// # Examples
///
/// ```
/// use mapgen_sitemap::{UrlRecord, xml};
///
/// let document = xml::encode_urlset(&[UrlRecord::new("https://example.com/?a=1&b=2")]).unwrap();
/// let document = String::from_utf8(document).unwrap();
/// assert!(document.contains("<loc>https://example.com/?a=1&amp;b=2</loc>"));
/// ```
#[instrument(skip_all, fields(records = records.len()))]
pub fn encode_urlset(records: &[UrlRecord]) -> Result<Vec<u8>> {
    let mut document = DocumentWriter::new("urlset")?;
    for record in records {
        document.open("url")?;
        document.element("loc", record.location())?;
        if let Some(last_modified) = record.last_modified() {
            document.element("lastmod", &format_lastmod(last_modified)?)?;
        }
        if let Some(change_frequency) = record.change_frequency() {
            document.element("changefreq", &change_frequency.to_string())?;
        }
        if let Some(priority) = record.priority() {
            document.element("priority", &priority.to_string())?;
        }
        document.close("url")?;
    }
    document.finish()
}

/// Encode an index as a `<sitemapindex>` document, in the index's order.
#[instrument(skip_all, fields(sitemaps = index.len()))]
pub fn encode_index(index: &Index) -> Result<Vec<u8>> {
    let mut document = DocumentWriter::new("sitemapindex")?;
    for sitemap in index.sitemaps() {
        document.open("sitemap")?;
        document.element("loc", &sitemap.location)?;
        document.element("lastmod", &format_lastmod(sitemap.last_modified)?)?;
        document.close("sitemap")?;
    }
    document.finish()
}

/// Decode a `<urlset>` document back into URL records, in document order.
pub fn decode_urlset(bytes: &[u8]) -> Result<Vec<UrlRecord>> {
    read_entries(bytes, b"urlset", b"url")?
        .into_iter()
        .map(|mut fields| {
            let location = fields.remove("loc").ok_or_raise(|| ErrorKind::MalformedDocument)?;
            let mut record = UrlRecord::new(location);
            if let Some(value) = fields.remove("lastmod") {
                record = record.with_last_modified(parse_lastmod(&value).ok_or_raise(|| ErrorKind::MalformedDocument)?);
            }
            if let Some(value) = fields.remove("changefreq") {
                record = record.with_change_frequency(value.parse::<ChangeFrequency>().ok().ok_or_raise(|| ErrorKind::MalformedDocument)?);
            }
            if let Some(value) = fields.remove("priority") {
                record = record.with_priority(value.parse::<Priority>().ok().ok_or_raise(|| ErrorKind::MalformedDocument)?);
            }
            Ok(record)
        })
        .collect()
}

/// Decode a `<sitemapindex>` document. Entries without a `<lastmod>` are
/// stamped with the current time.
pub fn decode_index(bytes: &[u8]) -> Result<Index> {
    read_entries(bytes, b"sitemapindex", b"sitemap")?
        .into_iter()
        .map(|mut fields| {
            let location = fields.remove("loc").ok_or_raise(|| ErrorKind::MalformedDocument)?;
            let last_modified = match fields.remove("lastmod") {
                Some(value) => parse_lastmod(&value).ok_or_raise(|| ErrorKind::MalformedDocument)?,
                None => OffsetDateTime::now_utc(),
            };
            Ok(SitemapRef::new(location, last_modified))
        })
        .collect()
}

/// RFC 3339 in UTC, keeping any fractional seconds. RFC 3339 has no room for
/// offsets with a seconds part, so every timestamp is written as `Z`.
fn format_lastmod(timestamp: OffsetDateTime) -> Result<String> {
    let timestamp = timestamp.checked_to_offset(UtcOffset::UTC).ok_or_raise(|| ErrorKind::MalformedDocument)?;
    timestamp.format(&Rfc3339).or_raise(|| ErrorKind::MalformedDocument)
}

/// Characters allowed by the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

struct DocumentWriter {
    writer: Writer<Vec<u8>>,
    root: &'static str,
}
impl DocumentWriter {
    fn new(root: &'static str) -> Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .or_raise(|| ErrorKind::MalformedDocument)?;
        let mut start = BytesStart::new(root);
        start.push_attribute(("xmlns", SITEMAP_NAMESPACE));
        writer.write_event(Event::Start(start)).or_raise(|| ErrorKind::MalformedDocument)?;
        Ok(Self { writer, root })
    }

    fn open(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new(name))).or_raise(|| ErrorKind::MalformedDocument)
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name))).or_raise(|| ErrorKind::MalformedDocument)
    }

    fn element(&mut self, name: &str, value: &str) -> Result<()> {
        if !value.chars().all(is_xml_char) {
            tracing::debug!(element = name, "Value contains characters not representable in XML");
            exn::bail!(ErrorKind::MalformedDocument);
        }
        self.open(name)?;
        self.writer.write_event(Event::Text(BytesText::new(value))).or_raise(|| ErrorKind::MalformedDocument)?;
        self.close(name)
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.close(self.root)?;
        Ok(self.writer.into_inner())
    }
}

type Fields = BTreeMap<String, String>;

/// Collect the text children of every `entry` element below `root`.
///
/// Field values are kept verbatim, surrounding whitespace included; text
/// outside a field (indentation between elements) is ignored.
fn read_entries(bytes: &[u8], root: &[u8], entry: &[u8]) -> Result<Vec<Fields>> {
    let mut reader = Reader::from_reader(bytes);

    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut seen_root = false;
    let mut current: Option<Fields> = None;
    let mut field: Option<String> = None;
    // Nesting below the open entry; only direct children are fields.
    let mut depth = 0usize;
    loop {
        match reader.read_event_into(&mut buf).or_raise(|| ErrorKind::MalformedDocument)? {
            Event::Start(e) => {
                let name = e.local_name();
                if !seen_root {
                    if name.as_ref() != root {
                        exn::bail!(ErrorKind::MalformedDocument);
                    }
                    seen_root = true;
                } else if current.is_some() {
                    depth += 1;
                    field = (depth == 1).then(|| String::from_utf8_lossy(name.as_ref()).into_owned());
                } else if name.as_ref() == entry {
                    current = Some(Fields::new());
                    depth = 0;
                }
            },
            // `<url/>` has no `<loc>`; let the caller reject it.
            Event::Empty(e) if current.is_none() && e.local_name().as_ref() == entry => entries.push(Fields::new()),
            Event::Text(text) => {
                if let (Some(fields), Some(name)) = (current.as_mut(), field.as_ref()) {
                    let value = text.unescape().or_raise(|| ErrorKind::MalformedDocument)?;
                    fields.entry(name.clone()).or_default().push_str(&value);
                }
            },
            Event::End(_) if current.is_some() && depth > 0 => {
                depth -= 1;
                field = None;
            },
            Event::End(e) if e.local_name().as_ref() == entry => {
                entries.push(current.take().ok_or_raise(|| ErrorKind::MalformedDocument)?);
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }
    if !seen_root || current.is_some() {
        exn::bail!(ErrorKind::MalformedDocument);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    fn timestamp() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_709_296_200).unwrap()
    }

    #[test]
    fn test_encode_urlset_shape() {
        let records = vec![
            UrlRecord::new("https://example.com/")
                .with_last_modified(timestamp())
                .with_change_frequency(ChangeFrequency::Daily)
                .with_priority(Priority::new(1.0).unwrap()),
            UrlRecord::new("https://example.com/about"),
        ];
        let document = String::from_utf8(encode_urlset(&records).unwrap()).unwrap();
        assert!(document.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(document.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(document.contains("<loc>https://example.com/</loc>"));
        assert!(document.contains("<lastmod>2024-03-01T12:30:00Z</lastmod>"));
        assert!(document.contains("<changefreq>daily</changefreq>"));
        assert!(document.contains("<priority>1.0</priority>"));
        // Optional elements are omitted, not emitted empty.
        assert_eq!(document.matches("<lastmod>").count(), 1);
        assert_eq!(document.matches("<url>").count(), 2);
        assert!(document.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_encode_empty_urlset() {
        let document = encode_urlset(&[]).unwrap();
        assert!(decode_urlset(&document).unwrap().is_empty());
        assert!(String::from_utf8(document).unwrap().contains("</urlset>"));
    }

    #[test]
    fn test_urlset_round_trip_preserves_order_and_escaping() {
        let records = vec![
            UrlRecord::new("https://example.com/search?q=a&page=2"),
            UrlRecord::new("https://example.com/<weird>\"quotes\"")
                .with_last_modified(timestamp())
                .with_priority(Priority::new(0.25).unwrap()),
            UrlRecord::new("https://example.com/ünïcødé").with_change_frequency(ChangeFrequency::Never),
        ];
        let decoded = decode_urlset(&encode_urlset(&records).unwrap()).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_lastmod_keeps_fractional_seconds() {
        let records = vec![UrlRecord::new("/a").with_last_modified(datetime!(2023-11-14 22:13:20.123456789 UTC))];
        let document = encode_urlset(&records).unwrap();
        assert!(String::from_utf8_lossy(&document).contains("<lastmod>2023-11-14T22:13:20.123456789Z</lastmod>"));
        assert_eq!(decode_urlset(&document).unwrap(), records);
    }

    #[rstest]
    #[case(datetime!(2024-03-01 13:30:00 +01:00))]
    #[case(datetime!(2024-03-01 13:30:30 +01:00:30))]
    #[case(datetime!(2024-03-01 07:00:00 -05:30))]
    fn test_lastmod_written_in_utc(#[case] last_modified: OffsetDateTime) {
        let records = vec![UrlRecord::new("/a").with_last_modified(last_modified)];
        let document = encode_urlset(&records).unwrap();
        let text = String::from_utf8(document.clone()).unwrap();
        assert!(text.contains("<lastmod>2024-03-01T12:30:00Z</lastmod>"));
        // Same instant, so the decoded record compares equal.
        assert_eq!(decode_urlset(&document).unwrap(), records);
    }

    #[rstest]
    #[case(" /a ")]
    #[case("\t/a")]
    #[case("/a\n")]
    fn test_location_whitespace_is_preserved(#[case] location: &str) {
        let records = vec![UrlRecord::new(location)];
        assert_eq!(decode_urlset(&encode_urlset(&records).unwrap()).unwrap(), records);
    }

    #[rstest]
    #[case("https://example.com/\0")]
    #[case("https://example.com/\u{1b}[0m")]
    #[case("\u{FFFF}")]
    fn test_encode_rejects_unrepresentable(#[case] location: &str) {
        let err = encode_urlset(&[UrlRecord::new(location)]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedDocument));
    }

    #[test]
    fn test_index_round_trip() {
        let index: Index = vec![
            SitemapRef::new("https://example.com/site_1.xml.gz", timestamp()),
            SitemapRef::new("https://example.com/site_2.xml.gz", timestamp()),
        ]
        .into_iter()
        .collect();
        let document = encode_index(&index).unwrap();
        let text = String::from_utf8(document.clone()).unwrap();
        assert!(text.contains(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert_eq!(decode_index(&document).unwrap(), index);
    }

    #[test]
    fn test_decode_index_defaults_lastmod() {
        let document = br#"<sitemapindex><sitemap><loc>/site_1.xml.gz</loc></sitemap></sitemapindex>"#;
        let before = OffsetDateTime::now_utc();
        let index = decode_index(document).unwrap();
        assert_eq!(index.sitemaps()[0].location, "/site_1.xml.gz");
        assert!(index.sitemaps()[0].last_modified >= before);
    }

    #[rstest]
    #[case(b"not xml at all".as_slice())]
    #[case(b"<sitemapindex></sitemapindex>".as_slice())]
    #[case(b"<urlset><url><lastmod>2024-01-01</lastmod></url></urlset>".as_slice())]
    #[case(b"<urlset><url/></urlset>".as_slice())]
    #[case(b"<urlset><url><loc>/a</loc><priority>7</priority></url></urlset>".as_slice())]
    #[case(b"<urlset><url><loc>/a</loc></urlset>".as_slice())]
    fn test_decode_urlset_rejects(#[case] document: &[u8]) {
        assert!(decode_urlset(document).is_err());
    }

    #[test]
    fn test_decode_ignores_unknown_elements() {
        let document = br#"<?xml version="1.0"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
              <url><loc>/a</loc><image:image><image:loc>/a.png</image:loc></image:image></url>
            </urlset>"#;
        let records = decode_urlset(document).unwrap();
        assert_eq!(records, vec![UrlRecord::new("/a")]);
    }
}
