//! Collaborator contracts the aggregation pipeline consumes.
//!
//! Storage, search and caching live outside the core. Each concern is a
//! trait; [`IndexBackend`] bundles them so aggregates can hold a single
//! `&dyn IndexBackend`. Every method returns `anyhow::Result`, and the core
//! passes failures through unchanged (no retries).
//!
//! Implementations in this crate: [`crate::memory::InMemoryBackend`] and
//! [`crate::db::SqliteBackend`].

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::model::agency::{Agency, AgencyId};
use crate::model::entry::EntryRow;
use crate::model::entry_type;
use crate::window::PublicationWindow;

/// Which entries an agency-year covers: those assigned to `agency_id`, minus
/// any also assigned to an excluded (child) agency, published in `window`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryScope {
    pub agency_id: AgencyId,
    pub excluded_agency_ids: Vec<AgencyId>,
    pub window: PublicationWindow,
}

/// Cached per agency-year counters, written after an aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgencyStatus {
    pub year: i32,
    pub agency_id: AgencyId,
    pub needs_attention_count: usize,
    pub last_published: Option<NaiveDate>,
}

/// Full entry rows for a scope.
pub trait EntryStore {
    /// Rows ordered by publication date, carrying every field in
    /// [`crate::model::entry::ENTRY_FIELDS`].
    fn fetch_entries(&self, scope: &EntryScope) -> Result<Vec<EntryRow>>;
}

/// Counting without materializing rows.
pub trait EntrySearch {
    fn count_entries(&self, scope: &EntryScope) -> Result<usize>;

    /// Entry counts bucketed by agency, in one call.
    fn entry_counts_by_agency(&self, window: &PublicationWindow)
    -> Result<HashMap<AgencyId, usize>>;
}

/// Review checkpoints and the cached attention counts derived from them.
pub trait CheckpointStore {
    fn last_completed_issue(&self, year: i32, agency_id: AgencyId) -> Result<Option<NaiveDate>>;

    /// Cached needs-attention counts for every agency, in one call.
    fn needs_attention_counts(&self, year: i32) -> Result<HashMap<AgencyId, usize>>;
}

pub trait AgencyDirectory {
    fn agencies_by_ids(&self, ids: &[AgencyId]) -> Result<Vec<Agency>>;

    fn child_agency_ids(&self, parent_id: AgencyId) -> Result<Vec<AgencyId>>;

    /// Look an agency up by slug or numeric id.
    fn find_agency(&self, key: &str) -> Result<Option<Agency>>;
}

/// Sink for [`AgencyStatus`] rows.
pub trait StatusCache {
    fn write_status(&self, status: &AgencyStatus) -> Result<()>;
}

/// Entry-type code to display label.
pub trait EntryTypeNames {
    fn entry_type_name(&self, code: &str) -> String {
        entry_type::display_name(code).to_string()
    }
}

/// Everything an index build needs from the outside world.
pub trait IndexBackend:
    EntryStore + EntrySearch + CheckpointStore + AgencyDirectory + StatusCache + EntryTypeNames
{
}

impl<T> IndexBackend for T where
    T: EntryStore + EntrySearch + CheckpointStore + AgencyDirectory + StatusCache + EntryTypeNames
{
}
