//! Embedded image metadata, decoded into a flat, ordered field map.
//!
//! The reader turns raw image bytes into an [`EmbeddedMetadata`] map keyed by
//! EXIF field name (`Make`, `FNumber`, `GPSLatitude`, ...). Values are
//! normalized into [`MetadataValue`] so the sidecar writer never has to
//! inspect raw EXIF encodings.

#[cfg(test)]
pub(crate) mod fixtures;
mod reader;

pub use reader::{read_metadata, read_metadata_or_empty};

use chrono::{DateTime, NaiveDateTime, Utc};

/// Field holding the original capture time.
pub const DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
/// Decimal-degree latitude, negative in the southern hemisphere.
pub const GPS_LATITUDE: &str = "GPSLatitude";
/// Decimal-degree longitude, negative west of Greenwich.
pub const GPS_LONGITUDE: &str = "GPSLongitude";

/// A single decoded metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Sequence(Vec<String>),
    /// Binary blobs, maker notes and other structures with no text form.
    Unsupported,
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<DateTime<Utc>> for MetadataValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Date(dt)
    }
}

/// Metadata embedded in an image, in the order the fields were decoded.
///
/// An empty map is a valid value: it is what a failed or absent extraction
/// produces, and the sidecar writer handles it like any other map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedMetadata {
    entries: Vec<(String, MetadataValue)>,
}

impl EmbeddedMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. An existing field keeps its position and gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MetadataValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Numeric value of a field, if it holds a finite number.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            MetadataValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Timestamp value of a field. Text values are accepted when they parse
    /// as an EXIF or RFC 3339 timestamp.
    pub fn date(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.get(name)? {
            MetadataValue::Date(dt) => Some(*dt),
            MetadataValue::Text(s) => parse_datetime(s),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for EmbeddedMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Parse an EXIF (`2024:01:15 10:30:45`), ISO (`2024-01-15 10:30:45`) or
/// RFC 3339 timestamp. Offset-less timestamps are taken as UTC.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim().trim_matches('"');

    for fmt in ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
