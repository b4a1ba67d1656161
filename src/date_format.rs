//! Serde support for serializing [time::Date] as `YYYY-MM-DD`.
//!
//! The default serde representation for [time::Date] is not the ISO string
//! the JSON API (and the SQLite TEXT columns) use, so date fields opt into
//! this module with `#[serde(with = "crate::date_format")]` (or the `option`
//! submodule for nullable dates).

use serde::{Deserialize, Deserializer, Serializer};
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

/// The date format used in JSON bodies, query parameters, and the database.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// The format for creation timestamps stored in the database and echoed in
/// JSON responses.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// The current UTC time as a `YYYY-MM-DD HH:MM:SS` string, for `created_at`
/// columns.
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` string into a [Date].
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, DATE_FORMAT)
}

/// Render a [Date] as `YYYY-MM-DD`.
///
/// The format has no components a valid [Date] cannot supply, so formatting
/// never fails in practice.
pub fn date_text(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_date(&text).map_err(serde::de::Error::custom)
}

/// Same format for `Option<Date>` fields. Combine with `#[serde(default)]`
/// so absent fields deserialize to `None`.
pub mod option {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::{DATE_FORMAT, parse_date};

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => {
                let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => parse_date(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod date_format_tests {
    use serde::{Deserialize, Serialize};
    use time::macros::date;

    use super::parse_date;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "crate::date_format")]
        date: time::Date,
        #[serde(default, with = "crate::date_format::option")]
        maybe_date: Option<time::Date>,
    }

    #[test]
    fn serializes_as_iso_string() {
        let holder = Holder {
            date: date!(2025 - 08 - 07),
            maybe_date: None,
        };

        let json = serde_json::to_string(&holder).expect("Could not serialize date");

        assert_eq!(json, r#"{"date":"2025-08-07","maybe_date":null}"#);
    }

    #[test]
    fn deserializes_iso_string() {
        let json = r#"{"date":"2025-08-07","maybe_date":"2025-12-31"}"#;

        let holder: Holder = serde_json::from_str(json).expect("Could not deserialize date");

        assert_eq!(holder.date, date!(2025 - 08 - 07));
        assert_eq!(holder.maybe_date, Some(date!(2025 - 12 - 31)));
    }

    #[test]
    fn absent_optional_date_deserializes_to_none() {
        let json = r#"{"date":"2025-08-07"}"#;

        let holder: Holder = serde_json::from_str(json).expect("Could not deserialize date");

        assert_eq!(holder.maybe_date, None);
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }

    #[test]
    fn timestamp_has_sqlite_datetime_shape() {
        let timestamp = super::now_timestamp();

        assert_eq!(timestamp.len(), 19, "got {timestamp:?}");
        assert_eq!(&timestamp[4..5], "-");
        assert_eq!(&timestamp[10..11], " ");
        assert_eq!(&timestamp[13..14], ":");
    }
}
