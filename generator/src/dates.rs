//! Date parsing and language-aware display.
//!
//! Dates travel through the record as strings. Two shapes are accepted:
//! a plain calendar day (`2024-08-06`) and an RFC 3339 timestamp.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use common::model::certificate::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Day(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl ParsedDate {
    /// Calendar day, in the timestamp's own offset for instants.
    pub fn day(&self) -> NaiveDate {
        match self {
            ParsedDate::Day(day) => *day,
            ParsedDate::Instant(instant) => instant.date_naive(),
        }
    }

    /// Plain days are compared by calendar date, instants by time.
    pub fn is_after(&self, now: DateTime<Utc>) -> bool {
        match self {
            ParsedDate::Day(day) => *day > now.date_naive(),
            ParsedDate::Instant(instant) => instant.with_timezone(&Utc) > now,
        }
    }
}

pub fn parse_date(value: &str) -> Option<ParsedDate> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(ParsedDate::Day(day));
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(ParsedDate::Instant)
}

/// Formats a date for display on the certificate.
///
/// English uses `M/D/YYYY`, Spanish, French and Portuguese `D/M/YYYY`,
/// German `D.M.YYYY`. Values that do not parse are returned unchanged.
pub fn display_date(value: &str, language: Option<Language>) -> String {
    let Some(parsed) = parse_date(value) else {
        return value.to_string();
    };
    let day = parsed.day();
    let (d, m, y) = (day.day(), day.month(), day.year());
    match language.unwrap_or_default() {
        Language::En => format!("{m}/{d}/{y}"),
        Language::Es | Language::Fr | Language::Pt => format!("{d}/{m}/{y}"),
        Language::De => format!("{d}.{m}.{y}"),
    }
}

/// `YYYY_MM_DD` for file names, when the value parses.
pub fn file_date(value: &str) -> Option<String> {
    parse_date(value).map(|p| p.day().format("%Y_%m_%d").to_string())
}

/// Today's date as stored in new records.
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
