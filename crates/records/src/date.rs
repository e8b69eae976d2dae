//! Serde helpers for the `dd/MM/yyyy` date format used on the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

/// Wire format for calendar dates.
pub const FORMAT: &str = "%d/%m/%Y";

pub fn format(date: &NaiveDate) -> String {
    date.format(FORMAT).to_string()
}

pub fn parse(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), FORMAT)
}

pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(date))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(|e| serde::de::Error::custom(format!("expected dd/MM/yyyy date, got {s:?}: {e}")))
}

/// Same format for optional dates; `null`, a missing field and `""` all mean "no date".
pub mod option {
    use super::*;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&super::format(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse(s)
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("expected dd/MM/yyyy date, got {s:?}: {e}"))),
        }
    }
}
