//! Publication-date windows and date parsing shared by the index builder and
//! the agency-year aggregates.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// The publication dates an index request covers.
///
/// A plain year covers January 1st through December 31st. With a max-date
/// cutoff the window runs from January 1st of the year through the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublicationWindow {
    Year(i32),
    Through { year: i32, max_date: NaiveDate },
}

impl PublicationWindow {
    #[must_use]
    pub const fn new(year: i32, max_date: Option<NaiveDate>) -> Self {
        match max_date {
            Some(max_date) => Self::Through { year, max_date },
            None => Self::Year(year),
        }
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        match self {
            Self::Year(year) | Self::Through { year, .. } => *year,
        }
    }

    /// First publication date in the window, as an ISO `YYYY-MM-DD` string.
    #[must_use]
    pub fn start_iso(&self) -> String {
        format!("{:04}-01-01", self.year())
    }

    /// Last publication date in the window, as an ISO `YYYY-MM-DD` string.
    #[must_use]
    pub fn end_iso(&self) -> String {
        match self {
            Self::Year(year) => format!("{year:04}-12-31"),
            Self::Through { max_date, .. } => max_date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Whether a publication date falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::Year(year) => date.year() == *year,
            Self::Through { year, max_date } => date.year() >= *year && date <= *max_date,
        }
    }
}

impl fmt::Display for PublicationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Through { year, max_date } => write!(f, "{year}-01-01..={max_date}"),
        }
    }
}

/// Parse a stored date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339 timestamps; the
/// time part is dropped.
///
/// # Errors
///
/// Returns the last parse error if no supported format matches.
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(stamp.date());
    }
    DateTime::parse_from_rfc3339(raw).map(|stamp| stamp.date_naive())
}

/// Today's date in the local timezone.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
