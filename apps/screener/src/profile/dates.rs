//! Date normalization for employment histories.
//!
//! Never fails: empty or unrecognised text resolves to "now". The origin of
//! every value is kept so fallbacks can be counted and logged.

use std::fmt;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Serialize, Serializer};

/// A calendar month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatePoint {
    pub year: i32,
    pub month: u32,
}

/// How a `DatePoint` was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrigin {
    Parsed,
    /// "present" / "current"
    Present,
    /// Empty or unrecognised text, resolved to now.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    pub point: DatePoint,
    pub origin: DateOrigin,
}

impl DatePoint {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn today() -> Self {
        Self::from(Utc::now().date_naive())
    }

    /// Whole months from `self` to `end`. Negative when `end` is earlier.
    pub fn months_until(&self, end: &DatePoint) -> i32 {
        (end.year - self.year) * 12 + (end.month as i32 - self.month as i32)
    }
}

impl From<NaiveDate> for DatePoint {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for DatePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl Serialize for DatePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses `text`, resolving "present"/"current" and failures to `today`.
/// The origin tells the two apart from a real parse.
pub fn normalize(text: &str, today: DatePoint) -> NormalizedDate {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("present") || trimmed.eq_ignore_ascii_case("current") {
        return NormalizedDate {
            point: today,
            origin: DateOrigin::Present,
        };
    }

    match parse_known_formats(trimmed) {
        Some(point) => NormalizedDate {
            point,
            origin: DateOrigin::Parsed,
        },
        None => NormalizedDate {
            point: today,
            origin: DateOrigin::Fallback,
        },
    }
}

/// Tries, in order: `MM/YYYY`, `YYYY/MM`, `Mon YYYY`, `Month YYYY`, `YYYY`.
///
/// The shape is checked before chrono sees the text: `%Y` alone would accept
/// `21` or `5` as a year.
fn parse_known_formats(text: &str) -> Option<DatePoint> {
    if let Some((left, right)) = text.split_once('/') {
        // chrono needs a day to build a date; pin every format to the 1st.
        let (candidate, fmt) = if is_month_number(left) && is_year(right) {
            (format!("01/{text}"), "%d/%m/%Y")
        } else if is_year(left) && is_month_number(right) {
            (format!("{text}/01"), "%Y/%m/%d")
        } else {
            return None;
        };
        return NaiveDate::parse_from_str(&candidate, fmt)
            .ok()
            .map(DatePoint::from);
    }

    let mut words = text.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(year), None, None) if is_year(year) => {
            year.parse::<i32>().ok().map(|year| DatePoint::new(year, 1))
        }
        (Some(name), Some(year), None) if is_year(year) => {
            let candidate = format!("01 {name} {year}");
            ["%d %b %Y", "%d %B %Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&candidate, fmt).ok())
                .map(DatePoint::from)
        }
        _ => None,
    }
}

fn is_year(token: &str) -> bool {
    token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit())
}

fn is_month_number(token: &str) -> bool {
    (1..=2).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_digit())
}
