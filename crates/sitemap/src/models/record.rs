use derive_more::Display;
use std::str::FromStr;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{Date, OffsetDateTime, Time};

/// How often the page at a location is likely to change (`<changefreq>`).
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum ChangeFrequency {
    #[display("always")]
    Always,
    #[display("hourly")]
    Hourly,
    #[display("daily")]
    Daily,
    #[display("weekly")]
    Weekly,
    #[display("monthly")]
    Monthly,
    #[display("yearly")]
    Yearly,
    #[display("never")]
    Never,
}
impl FromStr for ChangeFrequency {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(format!("unknown change frequency: {s}")),
        }
    }
}

/// Relative priority of a location within its site (`<priority>`).
///
/// Always within `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Priority(f32);
impl Priority {
    /// Returns `None` for values outside `0.0..=1.0`, including NaN.
    pub fn new(value: f32) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}
impl std::fmt::Display for Priority {
    // Always at least one decimal place, as in the protocol's examples ("1.0", "0.8").
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.fract() == 0.0 { write!(f, "{:.1}", self.0) } else { write!(f, "{}", self.0) }
    }
}
impl FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f32 = s.trim().parse().map_err(|_| format!("invalid priority: {s}"))?;
        Self::new(value).ok_or_else(|| format!("priority out of range: {s}"))
    }
}

/// One `<url>` entry of a sitemap.
///
/// Immutable once built; the `with_*` methods consume the record and return
/// an updated copy.
///
/// # Examples
///
/// ```
/// use mapgen_sitemap::{ChangeFrequency, Priority, UrlRecord};
///
/// let record = UrlRecord::new("https://example.com/about")
///     .with_change_frequency(ChangeFrequency::Monthly)
///     .with_priority(Priority::new(0.8).unwrap());
/// assert_eq!(record.location(), "https://example.com/about");
/// assert_eq!(record.last_modified(), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UrlRecord {
    location: String,
    last_modified: Option<OffsetDateTime>,
    change_frequency: Option<ChangeFrequency>,
    priority: Option<Priority>,
}
impl UrlRecord {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            last_modified: None,
            change_frequency: None,
            priority: None,
        }
    }

    pub fn with_last_modified(self, last_modified: OffsetDateTime) -> Self {
        Self { last_modified: Some(last_modified), ..self }
    }

    pub fn with_change_frequency(self, change_frequency: ChangeFrequency) -> Self {
        Self { change_frequency: Some(change_frequency), ..self }
    }

    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority: Some(priority), ..self }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn last_modified(&self) -> Option<OffsetDateTime> {
        self.last_modified
    }

    pub fn change_frequency(&self) -> Option<ChangeFrequency> {
        self.change_frequency
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }
}

/// Parse a W3C datetime as used by `<lastmod>`: either a full RFC 3339
/// timestamp or a bare `YYYY-MM-DD` date (taken as midnight UTC).
pub fn parse_lastmod(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(timestamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(timestamp);
    }
    Date::parse(value, &Iso8601::DATE).ok().map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
}
