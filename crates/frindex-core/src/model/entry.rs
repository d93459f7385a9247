//! One published Federal Register entry, as seen by the index.
//!
//! Stores hand back loosely typed rows ([`EntryRow`]): a mapping from field
//! name to a [`RawValue`]. [`Entry::from_row`] coerces each field into its
//! typed form once, so the grouping code never touches strings where it
//! expects dates or counts.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::window;

/// Stable entry identifier (the store's primary key).
pub type EntryId = i64;

pub const FIELD_ID: &str = "id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_DOCUMENT_NUMBER: &str = "document_number";
pub const FIELD_PUBLICATION_DATE: &str = "publication_date";
pub const FIELD_ORIGINAL_SUBJECT: &str = "original_subject";
pub const FIELD_MODIFIED_SUBJECT: &str = "modified_subject";
pub const FIELD_ORIGINAL_DOC: &str = "original_doc";
pub const FIELD_MODIFIED_DOC: &str = "modified_doc";
pub const FIELD_GRANULE_CLASS: &str = "granule_class";
pub const FIELD_START_PAGE: &str = "start_page";
pub const FIELD_END_PAGE: &str = "end_page";
pub const FIELD_COMMENTS_CLOSE_ON: &str = "comments_close_on";
pub const FIELD_SIGNIFICANT: &str = "significant";
pub const FIELD_COMMENT_COUNT: &str = "comment_count";

/// Every field an entry row may carry, in select order.
pub const ENTRY_FIELDS: &[&str] = &[
    FIELD_ID,
    FIELD_TITLE,
    FIELD_DOCUMENT_NUMBER,
    FIELD_PUBLICATION_DATE,
    FIELD_ORIGINAL_SUBJECT,
    FIELD_MODIFIED_SUBJECT,
    FIELD_ORIGINAL_DOC,
    FIELD_MODIFIED_DOC,
    FIELD_GRANULE_CLASS,
    FIELD_START_PAGE,
    FIELD_END_PAGE,
    FIELD_COMMENTS_CLOSE_ON,
    FIELD_SIGNIFICANT,
    FIELD_COMMENT_COUNT,
];

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// A single untyped column value as a store returns it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A raw entry row: field name to untyped value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryRow {
    fields: BTreeMap<String, RawValue>,
}

impl EntryRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<RawValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Value for `field`; absent fields read as [`RawValue::Null`].
    #[must_use]
    pub fn get(&self, field: &str) -> &RawValue {
        self.fields.get(field).unwrap_or(&RawValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A raw row that cannot be turned into an [`Entry`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntryError {
    #[error("entry row is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("entry field '{field}' has malformed date {value}")]
    MalformedDate { field: &'static str, value: String },

    #[error("entry field '{field}' has malformed number {value}")]
    MalformedNumber { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// An immutable, typed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    pub document_number: String,
    pub publication_date: NaiveDate,
    pub original_subject: Option<String>,
    pub modified_subject: Option<String>,
    pub original_doc: Option<String>,
    pub modified_doc: Option<String>,
    /// Entry-type code (`RULE`, `PRORULE`, `NOTICE`, ...).
    pub granule_class: String,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub comments_close_on: Option<NaiveDate>,
    pub significant: bool,
    pub comment_count: u32,
}

impl Entry {
    /// Coerce a raw row into an entry.
    ///
    /// Dates are parsed, numbers are converted, and an absent comment count
    /// becomes zero. Absent page numbers stay absent.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError`] for a missing required field or a date/number
    /// that does not parse.
    pub fn from_row(row: &EntryRow) -> Result<Self, EntryError> {
        Ok(Self {
            id: required(FIELD_ID, integer_field(row, FIELD_ID)?)?,
            title: text_field(row, FIELD_TITLE).unwrap_or_default(),
            document_number: required(
                FIELD_DOCUMENT_NUMBER,
                text_field(row, FIELD_DOCUMENT_NUMBER),
            )?,
            publication_date: required(
                FIELD_PUBLICATION_DATE,
                date_field(row, FIELD_PUBLICATION_DATE)?,
            )?,
            original_subject: text_field(row, FIELD_ORIGINAL_SUBJECT),
            modified_subject: text_field(row, FIELD_MODIFIED_SUBJECT),
            original_doc: text_field(row, FIELD_ORIGINAL_DOC),
            modified_doc: text_field(row, FIELD_MODIFIED_DOC),
            granule_class: required(
                FIELD_GRANULE_CLASS,
                text_field(row, FIELD_GRANULE_CLASS),
            )?,
            start_page: count_field(row, FIELD_START_PAGE)?,
            end_page: count_field(row, FIELD_END_PAGE)?,
            comments_close_on: date_field(row, FIELD_COMMENTS_CLOSE_ON)?,
            significant: flag_field(row, FIELD_SIGNIFICANT),
            comment_count: count_field(row, FIELD_COMMENT_COUNT)?.unwrap_or(0),
        })
    }

    /// Subject used for grouping: the index override if present, else the
    /// table-of-contents subject. Empty when neither exists.
    #[must_use]
    pub fn effective_subject(&self) -> &str {
        self.modified_subject
            .as_deref()
            .or(self.original_subject.as_deref())
            .unwrap_or("")
    }

    /// Document description used for grouping, resolved like
    /// [`effective_subject`](Self::effective_subject).
    #[must_use]
    pub fn effective_doc(&self) -> &str {
        self.modified_doc
            .as_deref()
            .or(self.original_doc.as_deref())
            .unwrap_or("")
    }

    /// True when the effective subject is absent or whitespace only.
    #[must_use]
    pub fn has_blank_subject(&self) -> bool {
        self.effective_subject().trim().is_empty()
    }

    /// Whether an editor overrode the subject or document text.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified_subject.is_some() || self.modified_doc.is_some()
    }

    #[must_use]
    pub const fn is_significant(&self) -> bool {
        self.significant
    }

    /// Whether the comment period is still open today.
    #[must_use]
    pub fn comments_open(&self) -> bool {
        self.comments_open_on(window::today())
    }

    /// Whether the comment period is still open on `date`.
    #[must_use]
    pub fn comments_open_on(&self, date: NaiveDate) -> bool {
        self.comments_close_on.is_some_and(|close| close >= date)
    }

    #[must_use]
    pub fn pdf_url(&self) -> String {
        format!(
            "http://www.gpo.gov/fdsys/pkg/FR-{}/pdf/{}.pdf",
            self.publication_date.format("%Y-%m-%d"),
            self.document_number
        )
    }

    /// `start-end`, or just `start` for single-page entries.
    #[must_use]
    pub fn page_range(&self) -> Option<String> {
        match (self.start_page, self.end_page) {
            (Some(start), Some(end)) if end > start => Some(format!("{start}-{end}")),
            (Some(start), _) => Some(start.to_string()),
            (None, Some(end)) => Some(end.to_string()),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, EntryError> {
    value.ok_or(EntryError::MissingField { field })
}

fn text_field(row: &EntryRow, field: &str) -> Option<String> {
    match row.get(field) {
        RawValue::Null => None,
        RawValue::Text(s) => Some(s.clone()),
        RawValue::Integer(n) => Some(n.to_string()),
        RawValue::Real(x) => Some(x.to_string()),
    }
}

fn date_field(row: &EntryRow, field: &'static str) -> Result<Option<NaiveDate>, EntryError> {
    match row.get(field) {
        RawValue::Null => Ok(None),
        RawValue::Text(s) => window::parse_date(s)
            .map(Some)
            .map_err(|_| EntryError::MalformedDate {
                field,
                value: format!("{s:?}"),
            }),
        other => Err(EntryError::MalformedDate {
            field,
            value: other.to_string(),
        }),
    }
}

fn integer_field(row: &EntryRow, field: &'static str) -> Result<Option<i64>, EntryError> {
    let malformed = |value: &RawValue| EntryError::MalformedNumber {
        field,
        value: value.to_string(),
    };

    match row.get(field) {
        RawValue::Null => Ok(None),
        RawValue::Integer(n) => Ok(Some(*n)),
        #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
        RawValue::Real(x) if x.fract() == 0.0 && x.is_finite() => Ok(Some(*x as i64)),
        RawValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| malformed(row.get(field))),
        other => Err(malformed(other)),
    }
}

fn count_field(row: &EntryRow, field: &'static str) -> Result<Option<u32>, EntryError> {
    integer_field(row, field)?
        .map(|n| {
            u32::try_from(n).map_err(|_| EntryError::MalformedNumber {
                field,
                value: n.to_string(),
            })
        })
        .transpose()
}

#[allow(clippy::float_cmp)]
fn flag_field(row: &EntryRow, field: &str) -> bool {
    match row.get(field) {
        RawValue::Null => false,
        RawValue::Integer(n) => *n != 0,
        RawValue::Real(x) => *x != 0.0,
        RawValue::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "t" | "true"
        ),
    }
}
