//! In-process backend over plain collections.
//!
//! Used by tests and by callers that already hold their entries in memory.
//! It counts fetches and checkpoint lookups so callers can assert memoization,
//! and can be told to fail its next call.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use crate::backend::{
    AgencyDirectory, AgencyStatus, CheckpointStore, EntrySearch, EntryScope, EntryStore,
    EntryTypeNames, StatusCache,
};
use crate::model::agency::{Agency, AgencyId};
use crate::model::entry::{EntryRow, FIELD_PUBLICATION_DATE, RawValue};
use crate::window::{self, PublicationWindow};

#[derive(Debug, Clone)]
struct StoredEntry {
    agency_ids: Vec<AgencyId>,
    row: EntryRow,
}

impl StoredEntry {
    fn publication_date(&self) -> Option<NaiveDate> {
        match self.row.get(FIELD_PUBLICATION_DATE) {
            RawValue::Text(s) => window::parse_date(s).ok(),
            _ => None,
        }
    }

    fn in_window(&self, window: &PublicationWindow) -> bool {
        self.publication_date().is_some_and(|d| window.contains(d))
    }

    fn in_scope(&self, scope: &EntryScope) -> bool {
        self.agency_ids.contains(&scope.agency_id)
            && !self
                .agency_ids
                .iter()
                .any(|id| scope.excluded_agency_ids.contains(id))
            && self.in_window(&scope.window)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    agencies: BTreeMap<AgencyId, Agency>,
    entries: Vec<StoredEntry>,
    checkpoints: HashMap<(i32, AgencyId), NaiveDate>,
    attention_counts: HashMap<(i32, AgencyId), usize>,
    statuses: RefCell<Vec<AgencyStatus>>,
    fetch_calls: Cell<usize>,
    count_calls: Cell<usize>,
    checkpoint_calls: Cell<usize>,
    failure: RefCell<Option<String>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_agency(&mut self, agency: Agency) {
        self.agencies.insert(agency.id, agency);
    }

    /// Store an entry row assigned to every agency in `agency_ids`.
    pub fn add_entry(&mut self, agency_ids: &[AgencyId], row: EntryRow) {
        self.entries.push(StoredEntry {
            agency_ids: agency_ids.to_vec(),
            row,
        });
    }

    pub fn set_checkpoint(&mut self, year: i32, agency_id: AgencyId, issue: NaiveDate) {
        self.checkpoints.insert((year, agency_id), issue);
    }

    /// Seed the cached needs-attention count for an agency-year.
    pub fn set_needs_attention(&mut self, year: i32, agency_id: AgencyId, count: usize) {
        self.attention_counts.insert((year, agency_id), count);
    }

    /// Make the next backend call fail with `message`.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        *self.failure.borrow_mut() = Some(message.into());
    }

    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.get()
    }

    #[must_use]
    pub fn count_calls(&self) -> usize {
        self.count_calls.get()
    }

    #[must_use]
    pub fn checkpoint_calls(&self) -> usize {
        self.checkpoint_calls.get()
    }

    /// Status rows written so far, oldest first.
    #[must_use]
    pub fn statuses(&self) -> Vec<AgencyStatus> {
        self.statuses.borrow().clone()
    }

    fn check_failure(&self) -> Result<()> {
        if let Some(message) = self.failure.borrow_mut().take() {
            bail!(message);
        }
        Ok(())
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}

impl EntryStore for InMemoryBackend {
    fn fetch_entries(&self, scope: &EntryScope) -> Result<Vec<EntryRow>> {
        self.check_failure()?;
        Self::bump(&self.fetch_calls);

        let mut matching: Vec<&StoredEntry> =
            self.entries.iter().filter(|e| e.in_scope(scope)).collect();
        matching.sort_by_key(|e| e.publication_date());
        Ok(matching.into_iter().map(|e| e.row.clone()).collect())
    }
}

impl EntrySearch for InMemoryBackend {
    fn count_entries(&self, scope: &EntryScope) -> Result<usize> {
        self.check_failure()?;
        Self::bump(&self.count_calls);
        Ok(self.entries.iter().filter(|e| e.in_scope(scope)).count())
    }

    fn entry_counts_by_agency(
        &self,
        window: &PublicationWindow,
    ) -> Result<HashMap<AgencyId, usize>> {
        self.check_failure()?;
        Self::bump(&self.count_calls);

        let mut counts = HashMap::new();
        for entry in self.entries.iter().filter(|e| e.in_window(window)) {
            for id in &entry.agency_ids {
                *counts.entry(*id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

impl CheckpointStore for InMemoryBackend {
    fn last_completed_issue(&self, year: i32, agency_id: AgencyId) -> Result<Option<NaiveDate>> {
        self.check_failure()?;
        Self::bump(&self.checkpoint_calls);
        Ok(self.checkpoints.get(&(year, agency_id)).copied())
    }

    fn needs_attention_counts(&self, year: i32) -> Result<HashMap<AgencyId, usize>> {
        self.check_failure()?;
        Ok(self
            .attention_counts
            .iter()
            .filter(|((y, _), _)| *y == year)
            .map(|((_, id), count)| (*id, *count))
            .collect())
    }
}

impl AgencyDirectory for InMemoryBackend {
    fn agencies_by_ids(&self, ids: &[AgencyId]) -> Result<Vec<Agency>> {
        self.check_failure()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.agencies.get(id).cloned())
            .collect())
    }

    fn child_agency_ids(&self, parent_id: AgencyId) -> Result<Vec<AgencyId>> {
        self.check_failure()?;
        Ok(self
            .agencies
            .values()
            .filter(|a| a.parent_id == Some(parent_id))
            .map(|a| a.id)
            .collect())
    }

    fn find_agency(&self, key: &str) -> Result<Option<Agency>> {
        self.check_failure()?;
        if let Ok(id) = key.parse::<AgencyId>() {
            return Ok(self.agencies.get(&id).cloned());
        }
        Ok(self.agencies.values().find(|a| a.to_param() == key).cloned())
    }
}

impl StatusCache for InMemoryBackend {
    fn write_status(&self, status: &AgencyStatus) -> Result<()> {
        self.check_failure()?;
        let mut statuses = self.statuses.borrow_mut();
        statuses.retain(|s| !(s.year == status.year && s.agency_id == status.agency_id));
        statuses.push(status.clone());
        Ok(())
    }
}

impl EntryTypeNames for InMemoryBackend {}
