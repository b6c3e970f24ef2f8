//! Service timestamp format
//!
//! The workflow API writes timestamps as `2024-11-16 22:48:45`: UTC, a space
//! instead of `T`, no zone suffix. Some deployments append microseconds.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format used when sending timestamps (filters) and re-serializing entities
pub const SERVICE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepts an optional fractional part when reading
const SERVICE_TIME_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn parse_service_time(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), SERVICE_TIME_PARSE_FORMAT).map(|t| t.and_utc())
}

pub fn format_service_time(time: &DateTime<Utc>) -> String {
    time.format(SERVICE_TIME_FORMAT).to_string()
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_service_time(&raw).map_err(|e| {
        serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e))
    })
}

pub(crate) fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_service_time(time))
}

/// `null`, a missing field and `""` all mean "never"
pub(crate) mod option {
    use super::*;

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_service_time(&raw).map(Some).map_err(|e| {
                serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e))
            }),
        }
    }

    pub(crate) fn serialize<S>(time: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => super::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_parse_service_time() {
        let parsed = parse_service_time("2024-11-16 22:48:45").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 11, 16, 22, 48, 45).unwrap());
        assert_eq!(parsed.nanosecond(), 0);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let parsed = parse_service_time("2024-11-16 22:48:45.123456").unwrap();
        assert_eq!(parsed.nanosecond(), 123_456_000);
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!(parse_service_time("2024-11-16T22:48:45Z").is_err());
        assert!(parse_service_time("16/11/2024 22:48").is_err());
        assert!(parse_service_time("").is_err());
    }

    #[test]
    fn test_format_drops_subseconds() {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(format_service_time(&time), "2024-01-01 00:00:00");
    }
}
