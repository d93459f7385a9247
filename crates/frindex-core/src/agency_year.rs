//! One agency's slice of the index for one publication year.
//!
//! An [`AgencyYear`] is cheap to construct: nothing is fetched until a caller
//! asks for entries, counts or groupings, and each answer is memoized for the
//! lifetime of the instance. In particular the entry rows are fetched at most
//! once, and the checkpoint lookup is cached even when the store has none.

use chrono::{Datelike, NaiveDate};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::backend::{AgencyStatus, EntryScope, IndexBackend};
use crate::config::AvailableYears;
use crate::error::Result;
use crate::grouping::{DocumentTypePartition, Grouping};
use crate::model::agency::Agency;
use crate::model::entry::Entry;
use crate::window::{self, PublicationWindow};

/// Optional inputs for [`AgencyYear::new`].
#[derive(Default)]
pub struct AgencyYearOptions<'a> {
    /// Precomputed entry count (from a facet query). Skips the count query.
    pub entry_count: Option<usize>,
    /// Precomputed needs-attention count (from the status cache).
    pub needs_attention_count: Option<usize>,
    pub children: Vec<AgencyYear<'a>>,
    /// Cut the window off at this date instead of December 31st.
    pub max_date: Option<NaiveDate>,
}

pub struct AgencyYear<'a> {
    backend: &'a dyn IndexBackend,
    agency: Agency,
    year: i32,
    max_date: Option<NaiveDate>,
    children: Vec<AgencyYear<'a>>,
    needs_attention_count: Option<usize>,
    entry_count: OnceCell<usize>,
    scope: OnceCell<EntryScope>,
    entries: OnceCell<Vec<Entry>>,
    last_completed_issue: OnceCell<Option<NaiveDate>>,
    document_types: OnceCell<Vec<DocumentTypePartition>>,
}

impl fmt::Debug for AgencyYear<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgencyYear")
            .field("agency", &self.agency)
            .field("year", &self.year)
            .field("max_date", &self.max_date)
            .field("children", &self.children)
            .field("entry_count", &self.entry_count.get())
            .field("needs_attention_count", &self.needs_attention_count)
            .finish_non_exhaustive()
    }
}

impl<'a> AgencyYear<'a> {
    /// # Errors
    ///
    /// Returns [`crate::error::IndexError::YearNotAvailable`] when `year` is
    /// outside `years`.
    pub fn new(
        backend: &'a dyn IndexBackend,
        agency: Agency,
        year: i32,
        years: &AvailableYears,
        options: AgencyYearOptions<'a>,
    ) -> Result<Self> {
        years.check(year)?;

        let entry_count = options
            .entry_count
            .map_or_else(OnceCell::new, OnceCell::from);

        Ok(Self {
            backend,
            agency,
            year,
            max_date: options.max_date,
            children: options.children,
            needs_attention_count: options.needs_attention_count,
            entry_count,
            scope: OnceCell::new(),
            entries: OnceCell::new(),
            last_completed_issue: OnceCell::new(),
            document_types: OnceCell::new(),
        })
    }

    #[must_use]
    pub const fn agency(&self) -> &Agency {
        &self.agency
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.agency.name
    }

    /// URL slug: the stored slug, else one derived from the name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.agency.to_param()
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn max_date(&self) -> Option<NaiveDate> {
        self.max_date
    }

    #[must_use]
    pub const fn window(&self) -> PublicationWindow {
        PublicationWindow::new(self.year, self.max_date)
    }

    #[must_use]
    pub fn children(&self) -> &[AgencyYear<'a>] {
        &self.children
    }

    #[must_use]
    pub fn first_letter(&self) -> Option<char> {
        self.agency.first_letter()
    }

    #[must_use]
    pub fn is_current_year(&self) -> bool {
        self.year >= window::today().year()
    }

    /// The precomputed entry count, if one was supplied or already computed.
    #[must_use]
    pub fn known_entry_count(&self) -> Option<usize> {
        self.entry_count.get().copied()
    }

    /// # Errors
    ///
    /// Propagates agency directory failures.
    pub fn scope(&self) -> Result<&EntryScope> {
        if let Some(scope) = self.scope.get() {
            return Ok(scope);
        }

        let excluded_agency_ids = self.backend.child_agency_ids(self.agency.id)?;
        let scope = EntryScope {
            agency_id: self.agency.id,
            excluded_agency_ids,
            window: self.window(),
        };
        Ok(self.scope.get_or_init(|| scope))
    }

    /// Entries assigned to this agency (not to its children) in the window.
    ///
    /// # Errors
    ///
    /// Propagates store failures and malformed rows.
    pub fn entries(&self) -> Result<&[Entry]> {
        if let Some(entries) = self.entries.get() {
            return Ok(entries);
        }

        let scope = self.scope()?;
        let rows = self.backend.fetch_entries(scope)?;
        let entries = rows
            .iter()
            .map(Entry::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(
            agency_id = self.agency.id,
            year = self.year,
            count = entries.len(),
            "fetched agency-year entries"
        );

        Ok(self.entries.get_or_init(|| entries))
    }

    /// Precomputed count if supplied, else a scoped count query.
    ///
    /// # Errors
    ///
    /// Propagates search failures.
    pub fn entry_count(&self) -> Result<usize> {
        if let Some(count) = self.entry_count.get() {
            return Ok(*count);
        }

        let count = self.backend.count_entries(self.scope()?)?;
        Ok(*self.entry_count.get_or_init(|| count))
    }

    /// # Errors
    ///
    /// Propagates checkpoint store failures.
    pub fn last_completed_issue(&self) -> Result<Option<NaiveDate>> {
        if let Some(checkpoint) = self.last_completed_issue.get() {
            return Ok(*checkpoint);
        }

        let checkpoint = self
            .backend
            .last_completed_issue(self.year, self.agency.id)?;
        debug!(
            agency_id = self.agency.id,
            year = self.year,
            checkpoint = ?checkpoint,
            "looked up last completed issue"
        );
        Ok(*self.last_completed_issue.get_or_init(|| checkpoint))
    }

    /// Latest publication date among this agency-year's entries.
    ///
    /// # Errors
    ///
    /// See [`entries`](Self::entries).
    pub fn last_issue(&self) -> Result<Option<NaiveDate>> {
        Ok(self.entries()?.iter().map(|e| e.publication_date).max())
    }

    /// Entries partitioned by entry-type code, codes in descending order.
    ///
    /// # Errors
    ///
    /// See [`entries`](Self::entries) and
    /// [`last_completed_issue`](Self::last_completed_issue).
    pub fn document_types(&self) -> Result<&[DocumentTypePartition]> {
        if let Some(types) = self.document_types.get() {
            return Ok(types);
        }

        let checkpoint = self.last_completed_issue()?;
        let mut by_type: BTreeMap<&str, Vec<Entry>> = BTreeMap::new();
        for entry in self.entries()? {
            by_type
                .entry(entry.granule_class.as_str())
                .or_default()
                .push(entry.clone());
        }

        let types = by_type
            .into_iter()
            .rev()
            .map(|(code, entries)| {
                DocumentTypePartition::new(
                    code,
                    self.backend.entry_type_name(code),
                    entries,
                    checkpoint,
                )
            })
            .collect();

        Ok(self.document_types.get_or_init(|| types))
    }

    /// Precomputed count if supplied, else the sum over document types.
    ///
    /// # Errors
    ///
    /// See [`document_types`](Self::document_types).
    pub fn needs_attention_count(&self) -> Result<usize> {
        if let Some(count) = self.needs_attention_count {
            return Ok(count);
        }

        Ok(self
            .document_types()?
            .iter()
            .map(DocumentTypePartition::needs_attention_count)
            .sum())
    }

    /// Counters to cache for this agency-year.
    ///
    /// # Errors
    ///
    /// See [`document_types`](Self::document_types).
    pub fn status(&self) -> Result<AgencyStatus> {
        Ok(AgencyStatus {
            year: self.year,
            agency_id: self.agency.id,
            needs_attention_count: self.needs_attention_count()?,
            last_published: self.last_issue()?,
        })
    }

    /// Push [`status`](Self::status) to the status cache.
    ///
    /// # Errors
    ///
    /// Propagates aggregation and cache-write failures.
    pub fn update_cache(&self) -> Result<()> {
        let status = self.status()?;
        self.backend.write_status(&status)?;
        info!(
            agency_id = status.agency_id,
            year = status.year,
            needs_attention = status.needs_attention_count,
            "updated agency-year status cache"
        );
        Ok(())
    }

    /// Point lookup of a grouping by entry-type code and header.
    ///
    /// Returns `Ok(None)` when either the type or the header is absent.
    ///
    /// # Errors
    ///
    /// See [`document_types`](Self::document_types).
    pub fn grouping_for(&self, granule_class: &str, header: &str) -> Result<Option<&Grouping>> {
        Ok(self
            .document_types()?
            .iter()
            .find(|dt| dt.granule_class() == granule_class)
            .and_then(|dt| dt.grouping(header)))
    }
}
