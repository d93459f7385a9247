//! The year-level index: every agency with entries in the window, arranged
//! as a parent/child tree and bucketed by first letter.

use chrono::NaiveDate;
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::agency_year::{AgencyYear, AgencyYearOptions};
use crate::backend::IndexBackend;
use crate::config::AvailableYears;
use crate::error::Result;
use crate::model::agency::{Agency, AgencyId};
use crate::window::PublicationWindow;

pub struct IndexBuilder<'a> {
    backend: &'a dyn IndexBackend,
    years: AvailableYears,
    year: i32,
    max_date: Option<NaiveDate>,
    entry_counts: OnceCell<HashMap<AgencyId, usize>>,
    needs_attention_counts: OnceCell<HashMap<AgencyId, usize>>,
    agencies: OnceCell<Vec<AgencyYear<'a>>>,
}

impl<'a> IndexBuilder<'a> {
    /// # Errors
    ///
    /// Returns [`crate::error::IndexError::YearNotAvailable`] when `year` is
    /// outside `years`.
    pub fn new(
        backend: &'a dyn IndexBackend,
        year: i32,
        max_date: Option<NaiveDate>,
        years: AvailableYears,
    ) -> Result<Self> {
        years.check(year)?;
        Ok(Self {
            backend,
            years,
            year,
            max_date,
            entry_counts: OnceCell::new(),
            needs_attention_counts: OnceCell::new(),
            agencies: OnceCell::new(),
        })
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

    /// Entry counts per agency for the window, from one facet query.
    ///
    /// # Errors
    ///
    /// Propagates search failures.
    pub fn entry_counts(&self) -> Result<&HashMap<AgencyId, usize>> {
        if let Some(counts) = self.entry_counts.get() {
            return Ok(counts);
        }

        let counts = self.backend.entry_counts_by_agency(&self.window())?;
        debug!(year = self.year, agencies = counts.len(), "fetched agency facet counts");
        Ok(self.entry_counts.get_or_init(|| counts))
    }

    /// Cached needs-attention counts for the full year. A max-date cutoff
    /// does not change them.
    ///
    /// # Errors
    ///
    /// Propagates checkpoint store failures.
    pub fn needs_attention_counts(&self) -> Result<&HashMap<AgencyId, usize>> {
        if let Some(counts) = self.needs_attention_counts.get() {
            return Ok(counts);
        }

        let counts = self.backend.needs_attention_counts(self.year)?;
        Ok(self.needs_attention_counts.get_or_init(|| counts))
    }

    /// Every agency with entries in the window, ordered by lower-cased name.
    ///
    /// Child agencies appear both at the top level and nested under their
    /// parent. A parent with children carries no precomputed entry count.
    ///
    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub fn agencies(&self) -> Result<&[AgencyYear<'a>]> {
        if let Some(agencies) = self.agencies.get() {
            return Ok(agencies);
        }

        let entry_counts = self.entry_counts()?;
        let attention = self.needs_attention_counts()?;

        let mut ids: Vec<AgencyId> = entry_counts.keys().copied().collect();
        ids.sort_unstable();
        let mut records = self.backend.agencies_by_ids(&ids)?;
        records.sort_by_cached_key(|a| (a.name.to_lowercase(), a.id));

        let mut agency_years = Vec::with_capacity(records.len());
        for agency in &records {
            let children = records
                .iter()
                .filter(|candidate| candidate.parent_id == Some(agency.id))
                .map(|child| {
                    self.agency_year(
                        child.clone(),
                        AgencyYearOptions {
                            entry_count: entry_counts.get(&child.id).copied(),
                            needs_attention_count: attention.get(&child.id).copied(),
                            ..AgencyYearOptions::default()
                        },
                    )
                })
                .collect::<Result<Vec<_>>>()?;

            let entry_count = if children.is_empty() {
                entry_counts.get(&agency.id).copied()
            } else {
                None
            };

            agency_years.push(self.agency_year(
                agency.clone(),
                AgencyYearOptions {
                    entry_count,
                    needs_attention_count: attention.get(&agency.id).copied(),
                    children,
                    ..AgencyYearOptions::default()
                },
            )?);
        }

        info!(
            year = self.year,
            max_date = ?self.max_date,
            agencies = agency_years.len(),
            "built agency index"
        );
        Ok(self.agencies.get_or_init(|| agency_years))
    }

    /// Top-level aggregates bucketed by the first character of the agency
    /// name. Agencies with an empty name are left out.
    ///
    /// # Errors
    ///
    /// See [`agencies`](Self::agencies).
    pub fn agencies_by_letter(&self) -> Result<BTreeMap<char, Vec<&AgencyYear<'a>>>> {
        let mut by_letter: BTreeMap<char, Vec<&AgencyYear<'a>>> = BTreeMap::new();
        for agency_year in self.agencies()? {
            if let Some(letter) = agency_year.first_letter() {
                by_letter.entry(letter).or_default().push(agency_year);
            }
        }
        Ok(by_letter)
    }

    fn agency_year(
        &self,
        agency: Agency,
        options: AgencyYearOptions<'a>,
    ) -> Result<AgencyYear<'a>> {
        AgencyYear::new(
            self.backend,
            agency,
            self.year,
            &self.years,
            AgencyYearOptions {
                max_date: self.max_date,
                ..options
            },
        )
    }
}
