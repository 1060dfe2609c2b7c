//! Date helpers shared by the layout engine, the rendering adapter and the
//! snapshot boundary.
//!
//! Stage dates are date-only: `YYYY-MM-DD` input lands on UTC midnight and
//! every day-based computation works on millisecond differences divided by
//! [`MS_PER_DAY`], so fractional days stay visible to callers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::{CoreError, CoreResult};

/// Milliseconds in one day.
pub const MS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Short Russian month names as rendered by the tooltip (no trailing dot).
const SHORT_MONTHS: [&str; 12] = [
    "янв", "февр", "мар", "апр", "мая", "июн", "июл", "авг", "сент", "окт", "нояб", "дек",
];

/// Fractional number of days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_DAY
}

/// Parse a date as either `YYYY-MM-DD` (UTC midnight) or an RFC 3339 instant.
pub fn parse_date(input: &str) -> CoreResult<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidDate {
            input: input.to_string(),
        })
}

/// Tooltip label such as `"28 янв"`; empty when the date is absent.
pub fn format_date_short(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => format!("{} {}", d.day(), SHORT_MONTHS[d.month0() as usize]),
        None => String::new(),
    }
}

/// Display label in `DD.MM.YY` form; `00.00.00` when the date is absent.
pub fn format_date_display(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.format("%d.%m.%y").to_string(),
        None => "00.00.00".to_string(),
    }
}

/// Serde adapter accepting `YYYY-MM-DD` or RFC 3339 and writing RFC 3339.
pub mod flexible {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }

    /// Optional variant for fields that may be absent or null.
    pub mod option {
        use chrono::{DateTime, SecondsFormat, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => s.serialize_some(&d.to_rfc3339_opts(SecondsFormat::Secs, true)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw {
                Some(text) if !text.trim().is_empty() => super::super::parse_date(&text)
                    .map(Some)
                    .map_err(D::Error::custom),
                _ => Ok(None),
            }
        }
    }
}
