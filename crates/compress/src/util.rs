use crate::Compression;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Compression {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl Compression {
    /// Returns the short name for configuration (for displaying to user)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        }
    }

    /// Full suffix of an XML document persisted with this format, such as
    /// `.xml.gz`.
    #[inline]
    #[must_use]
    pub fn xml_suffix(&self) -> &'static str {
        match self {
            Compression::None => ".xml",
            Compression::Gzip => ".xml.gz",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case(Compression::None, ".xml")]
    #[case(Compression::Gzip, ".xml.gz")]
    fn test_xml_suffix(#[case] format: Compression, #[case] suffix: &str) {
        assert_eq!(format.xml_suffix(), suffix);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for format in [Compression::None, Compression::Gzip] {
            assert_eq!(format.to_string().parse::<Compression>().unwrap(), format);
        }
    }
}
