use std::fmt;

use crate::model::entry::EntryError;

/// Stable `E####` codes the CLI prints next to a failure, grouped by class:
/// 1xxx setup, 2xxx lookups, 3xxx stored data, 5xxx backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    YearNotAvailable,
    AgencyNotFound,
    GroupingNotFound,
    MalformedEntry,
    BackendUnavailable,
}

impl ErrorCode {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::YearNotAvailable => "E2001",
            Self::AgencyNotFound => "E2002",
            Self::GroupingNotFound => "E2003",
            Self::MalformedEntry => "E3001",
            Self::BackendUnavailable => "E5001",
        }
    }

    /// One-line summary of the class.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Index database not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::YearNotAvailable => "Year not available",
            Self::AgencyNotFound => "Agency not found",
            Self::GroupingNotFound => "Grouping not found",
            Self::MalformedEntry => "Malformed entry row",
            Self::BackendUnavailable => "Backing store unavailable",
        }
    }

    /// What to try next.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `fri init` to create the index database."),
            Self::ConfigParseError => Some("Fix syntax in .frindex/config.toml and retry."),
            Self::YearNotAvailable => Some("Run `fri years` to list the available years."),
            Self::AgencyNotFound => Some("Use the agency slug or numeric id."),
            Self::GroupingNotFound => {
                Some("Run `fri agency <agency> --year <year>` to list the headers.")
            }
            Self::MalformedEntry => Some("Fix the stored entry dates and page/comment counts."),
            Self::BackendUnavailable => Some("Check the database path and retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.message())
    }
}

/// Errors raised by the aggregation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The requested year is outside the configured available range.
    #[error("year {year} is not available (available: {min}..={max})")]
    YearNotAvailable { year: i32, min: i32, max: i32 },

    /// A raw entry row failed type coercion.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// A collaborator (store, search index, cache) call failed.
    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl IndexError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::YearNotAvailable { .. } => ErrorCode::YearNotAvailable,
            Self::Entry(_) => ErrorCode::MalformedEntry,
            Self::Backend(_) => ErrorCode::BackendUnavailable,
        }
    }

    /// Lookup failures, as opposed to broken data or a broken store.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::YearNotAvailable { .. })
    }
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
