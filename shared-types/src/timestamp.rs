//! Timestamp parsing for stored histories.
//!
//! Values are written as RFC 3339. Older history files carry naive ISO-8601
//! local times without an offset (`2025-10-01T12:30:45.123456`); those are
//! read as local time.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp, with or without offset
pub fn parse(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())?;

    // Times skipped by a DST jump have no local reading
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    )
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse(&text).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {text}")))
}

pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| parse(&text).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {text}"))))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = parse("2026-03-01T10:00:00-06:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T16:00:00+00:00");
        assert_eq!(parse("2026-03-01T16:00:00Z"), Some(parsed));
    }

    #[test]
    fn test_naive_timestamp_read_as_local_time() {
        let parsed = parse("2025-10-01T12:30:45.123456").unwrap();
        let local = parsed.with_timezone(&Local).naive_local();

        assert_eq!(
            local,
            NaiveDateTime::parse_from_str("2025-10-01 12:30:45.123456", "%Y-%m-%d %H:%M:%S%.f")
                .unwrap()
        );
        assert_eq!(parse("2025-10-01T12:30:45"), parse("2025-10-01 12:30:45"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse(""), None);
    }

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(deserialize_with = "deserialize")]
        at: DateTime<Utc>,
        #[serde(default, deserialize_with = "deserialize_option")]
        seen: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_serde_helpers() {
        let value: Stamped =
            serde_json::from_str(r#"{"at": "2025-10-01T12:30:45.123456", "seen": null}"#).unwrap();
        assert_eq!(Some(value.at), parse("2025-10-01T12:30:45.123456"));
        assert_eq!(value.seen, None);

        let value: Stamped = serde_json::from_str(r#"{"at": "2026-03-01T16:00:00Z"}"#).unwrap();
        assert_eq!(value.seen, None);

        assert!(serde_json::from_str::<Stamped>(r#"{"at": "not a date"}"#).is_err());
    }
}
