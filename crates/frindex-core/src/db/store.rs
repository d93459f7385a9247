//! [`SqliteBackend`]: every collaborator trait over one SQLite connection,
//! plus the write helpers `fri import` and the editor commands use.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Row, named_params, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::backend::{
    AgencyDirectory, AgencyStatus, CheckpointStore, EntrySearch, EntryScope, EntryStore,
    EntryTypeNames, StatusCache,
};
use crate::model::agency::{Agency, AgencyId};
use crate::model::entry::{EntryId, EntryRow, RawValue};
use crate::model::regulatory_plan::{RegulatoryPlan, SIGNIFICANT_PRIORITY_CATEGORIES};
use crate::window::{self, PublicationWindow};

/// Entries assigned to `:agency_id`, not assigned to any agency in the
/// `:excluded` JSON array, and published between `:start` and `:end`.
const SCOPE_SQL: &str = "
    entries.publication_date BETWEEN :start AND :end
    AND EXISTS (
        SELECT 1 FROM agency_assignments AS assigned
        WHERE assigned.entry_id = entries.id AND assigned.agency_id = :agency_id
    )
    AND NOT EXISTS (
        SELECT 1 FROM agency_assignments AS excluded
        WHERE excluded.entry_id = entries.id
          AND excluded.agency_id IN (SELECT value FROM json_each(:excluded))
    )";

/// Column aliases match [`crate::model::entry::ENTRY_FIELDS`].
const ENTRY_SELECT_SQL: &str = "
    SELECT entries.id AS id,
        entries.title AS title,
        entries.document_number AS document_number,
        entries.publication_date AS publication_date,
        IFNULL(pi.toc_subject, entries.toc_subject) AS original_subject,
        entries.fr_index_subject AS modified_subject,
        IFNULL(IFNULL(pi.toc_doc, entries.toc_doc), entries.title) AS original_doc,
        entries.fr_index_doc AS modified_doc,
        entries.granule_class AS granule_class,
        entries.start_page AS start_page,
        entries.end_page AS end_page,
        comment_close.date AS comments_close_on,
        IFNULL(MAX(plans.priority_category IN (SELECT value FROM json_each(:significant))), 0)
            AS significant,
        IFNULL(dockets.comments_count, 0) AS comment_count
    FROM entries
    LEFT OUTER JOIN public_inspection_documents AS pi
        ON pi.entry_id = entries.id
    LEFT OUTER JOIN dockets
        ON dockets.id = entries.docket_id
    LEFT OUTER JOIN comment_close_events AS comment_close
        ON comment_close.entry_id = entries.id
    LEFT OUTER JOIN entry_regulation_id_numbers AS rins
        ON rins.entry_id = entries.id
    LEFT OUTER JOIN regulatory_plans AS plans
        ON plans.regulation_id_number = rins.regulation_id_number
        AND plans.current = 1
    WHERE";

/// The stored columns of one entry, as loaded from an import file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: EntryId,
    #[serde(default)]
    pub title: String,
    pub document_number: String,
    pub publication_date: NaiveDate,
    /// Subject as printed in the table of contents.
    #[serde(default)]
    pub toc_subject: Option<String>,
    #[serde(default)]
    pub toc_doc: Option<String>,
    /// Editor override for the subject.
    #[serde(default)]
    pub fr_index_subject: Option<String>,
    #[serde(default)]
    pub fr_index_doc: Option<String>,
    pub granule_class: String,
    #[serde(default)]
    pub start_page: Option<u32>,
    #[serde(default)]
    pub end_page: Option<u32>,
    #[serde(default)]
    pub docket_id: Option<String>,
}

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (creating and migrating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// See [`super::open_index`].
    pub fn open(path: &Path) -> Result<Self> {
        super::open_index(path).map(Self::new)
    }

    /// # Errors
    ///
    /// See [`super::open_in_memory`].
    pub fn open_in_memory() -> Result<Self> {
        super::open_in_memory().map(Self::new)
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    // -----------------------------------------------------------------------
    // Write helpers
    // -----------------------------------------------------------------------

    /// Insert or update an agency.
    ///
    /// # Errors
    ///
    /// Returns an error on constraint violations (duplicate slug, dangling
    /// parent at commit).
    pub fn insert_agency(&self, agency: &Agency) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO agencies (id, name, slug, parent_id) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    slug = excluded.slug,
                    parent_id = excluded.parent_id",
                params![agency.id, agency.name, agency.slug, agency.parent_id],
            )
            .with_context(|| format!("insert agency {}", agency.id))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error on constraint violations.
    pub fn insert_docket(&self, docket_id: &str, comments_count: u32) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO dockets (id, comments_count) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET comments_count = excluded.comments_count",
                params![docket_id, comments_count],
            )
            .with_context(|| format!("insert docket {docket_id}"))?;
        Ok(())
    }

    /// Insert or replace the stored columns of an entry.
    ///
    /// # Errors
    ///
    /// Returns an error on constraint violations (duplicate document number,
    /// unknown docket).
    pub fn insert_entry(&self, entry: &EntryRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO entries (
                    id, title, document_number, publication_date,
                    toc_subject, toc_doc, fr_index_subject, fr_index_doc,
                    granule_class, start_page, end_page, docket_id
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    document_number = excluded.document_number,
                    publication_date = excluded.publication_date,
                    toc_subject = excluded.toc_subject,
                    toc_doc = excluded.toc_doc,
                    fr_index_subject = excluded.fr_index_subject,
                    fr_index_doc = excluded.fr_index_doc,
                    granule_class = excluded.granule_class,
                    start_page = excluded.start_page,
                    end_page = excluded.end_page,
                    docket_id = excluded.docket_id",
                params![
                    entry.id,
                    entry.title,
                    entry.document_number,
                    entry.publication_date.to_string(),
                    entry.toc_subject,
                    entry.toc_doc,
                    entry.fr_index_subject,
                    entry.fr_index_doc,
                    entry.granule_class,
                    entry.start_page,
                    entry.end_page,
                    entry.docket_id,
                ],
            )
            .with_context(|| format!("insert entry {}", entry.id))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the entry or agency does not exist.
    pub fn assign_agency(&self, entry_id: EntryId, agency_id: AgencyId) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO agency_assignments (entry_id, agency_id) VALUES (?1, ?2)",
                params![entry_id, agency_id],
            )
            .with_context(|| format!("assign entry {entry_id} to agency {agency_id}"))?;
        Ok(())
    }

    /// Record pre-publication table-of-contents text for an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn insert_public_inspection(
        &self,
        entry_id: EntryId,
        toc_subject: Option<&str>,
        toc_doc: Option<&str>,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO public_inspection_documents (entry_id, toc_subject, toc_doc)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(entry_id) DO UPDATE SET
                    toc_subject = excluded.toc_subject,
                    toc_doc = excluded.toc_doc",
                params![entry_id, toc_subject, toc_doc],
            )
            .with_context(|| format!("insert public inspection text for entry {entry_id}"))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn insert_comment_close(&self, entry_id: EntryId, closes_on: NaiveDate) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO comment_close_events (entry_id, date) VALUES (?1, ?2)
                 ON CONFLICT(entry_id) DO UPDATE SET date = excluded.date",
                params![entry_id, closes_on.to_string()],
            )
            .with_context(|| format!("insert comment close date for entry {entry_id}"))?;
        Ok(())
    }

    /// Store a plan. Marking it current demotes other issues of the same RIN.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails.
    pub fn insert_regulatory_plan(&self, plan: &RegulatoryPlan) -> Result<()> {
        let plan_json = serde_json::to_string(plan).context("serialize regulatory plan")?;
        if plan.current {
            self.conn
                .execute(
                    "UPDATE regulatory_plans SET current = 0
                     WHERE regulation_id_number = ?1 AND issue <> ?2",
                    params![plan.regulation_id_number, plan.issue],
                )
                .context("demote previous regulatory plan issues")?;
        }
        self.conn
            .execute(
                "INSERT INTO regulatory_plans (
                    regulation_id_number, issue, title, priority_category, current, plan_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(regulation_id_number, issue) DO UPDATE SET
                    title = excluded.title,
                    priority_category = excluded.priority_category,
                    current = excluded.current,
                    plan_json = excluded.plan_json",
                params![
                    plan.regulation_id_number,
                    plan.issue,
                    plan.title,
                    plan.priority_category,
                    plan.current,
                    plan_json,
                ],
            )
            .with_context(|| {
                format!(
                    "insert regulatory plan {} ({})",
                    plan.regulation_id_number, plan.issue
                )
            })?;
        Ok(())
    }

    /// The current plan for a regulation identifier number, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored plan is corrupt.
    pub fn current_regulatory_plan(&self, rin: &str) -> Result<Option<RegulatoryPlan>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT plan_json FROM regulatory_plans
                 WHERE regulation_id_number = ?1 AND current = 1",
                [rin],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("load regulatory plan {rin}"))?;

        json.map(|json| {
            serde_json::from_str(&json).with_context(|| format!("decode regulatory plan {rin}"))
        })
        .transpose()
    }

    /// # Errors
    ///
    /// Returns an error if the entry does not exist.
    pub fn link_regulation(&self, entry_id: EntryId, rin: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO entry_regulation_id_numbers (entry_id, regulation_id_number)
                 VALUES (?1, ?2)",
                params![entry_id, rin],
            )
            .with_context(|| format!("link entry {entry_id} to {rin}"))?;
        Ok(())
    }

    /// Record the editor's review checkpoint for an agency-year.
    ///
    /// # Errors
    ///
    /// Returns an error if the agency does not exist.
    pub fn set_last_completed_issue(
        &self,
        year: i32,
        agency_id: AgencyId,
        issue: NaiveDate,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO agency_statuses (year, agency_id, last_completed_issue)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(year, agency_id) DO UPDATE SET
                    last_completed_issue = excluded.last_completed_issue",
                params![year, agency_id, issue.to_string()],
            )
            .with_context(|| format!("set last completed issue for agency {agency_id} in {year}"))?;
        debug!(year, agency_id, %issue, "stored last completed issue");
        Ok(())
    }

    /// Write cached counters, leaving the checkpoint untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the agency does not exist.
    pub fn upsert_status(&self, status: &AgencyStatus) -> Result<()> {
        let count = i64::try_from(status.needs_attention_count)
            .context("needs-attention count out of range")?;
        self.conn
            .execute(
                "INSERT INTO agency_statuses (year, agency_id, needs_attention_count, last_published)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(year, agency_id) DO UPDATE SET
                    needs_attention_count = excluded.needs_attention_count,
                    last_published = excluded.last_published",
                params![
                    status.year,
                    status.agency_id,
                    count,
                    status.last_published.map(|d| d.to_string()),
                ],
            )
            .with_context(|| {
                format!(
                    "write status for agency {} in {}",
                    status.agency_id, status.year
                )
            })?;
        Ok(())
    }

    /// Cached status for an agency-year, if one has been written. A row that
    /// only holds a checkpoint has no cached status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored date is corrupt.
    pub fn status(&self, year: i32, agency_id: AgencyId) -> Result<Option<AgencyStatus>> {
        let row: Option<(i64, Option<String>)> = self
            .conn
            .query_row(
                "SELECT needs_attention_count, last_published FROM agency_statuses
                 WHERE year = ?1 AND agency_id = ?2 AND needs_attention_count IS NOT NULL",
                params![year, agency_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("load agency status")?;

        row.map(|(count, last_published)| {
            Ok(AgencyStatus {
                year,
                agency_id,
                needs_attention_count: usize::try_from(count)
                    .context("negative needs-attention count")?,
                last_published: last_published.as_deref().map(stored_date).transpose()?,
            })
        })
        .transpose()
    }

    fn scope_params(scope: &EntryScope) -> Result<(String, String, String)> {
        let excluded = serde_json::to_string(&scope.excluded_agency_ids)
            .context("encode excluded agency ids")?;
        Ok((scope.window.start_iso(), scope.window.end_iso(), excluded))
    }
}

fn stored_date(raw: &str) -> Result<NaiveDate> {
    window::parse_date(raw).with_context(|| format!("malformed stored date {raw:?}"))
}

fn raw_value(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null => RawValue::Null,
        ValueRef::Integer(n) => RawValue::Integer(n),
        ValueRef::Real(x) => RawValue::Real(x),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            RawValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn agency_from_row(row: &Row<'_>) -> rusqlite::Result<Agency> {
    Ok(Agency {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        parent_id: row.get(3)?,
    })
}

fn to_count(raw: i64) -> Result<usize> {
    usize::try_from(raw).with_context(|| format!("negative count {raw}"))
}

impl EntryStore for SqliteBackend {
    fn fetch_entries(&self, scope: &EntryScope) -> Result<Vec<EntryRow>> {
        let (start, end, excluded) = Self::scope_params(scope)?;
        let significant = serde_json::to_string(SIGNIFICANT_PRIORITY_CATEGORIES)
            .context("encode priority categories")?;

        let sql = format!(
            "{ENTRY_SELECT_SQL} {SCOPE_SQL}
             GROUP BY entries.id
             ORDER BY entries.publication_date, entries.id"
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare entry query")?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let rows = stmt
            .query_map(
                named_params! {
                    ":start": start,
                    ":end": end,
                    ":agency_id": scope.agency_id,
                    ":excluded": excluded,
                    ":significant": significant,
                },
                |row| {
                    let mut entry = EntryRow::new();
                    for (idx, column) in columns.iter().enumerate() {
                        entry.set(column, raw_value(row.get_ref(idx)?));
                    }
                    Ok(entry)
                },
            )
            .context("query scoped entries")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read scoped entries")?;

        debug!(agency_id = scope.agency_id, window = %scope.window, rows = rows.len(), "fetched entry rows");
        Ok(rows)
    }
}

impl EntrySearch for SqliteBackend {
    fn count_entries(&self, scope: &EntryScope) -> Result<usize> {
        let (start, end, excluded) = Self::scope_params(scope)?;
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM entries WHERE {SCOPE_SQL}"),
                named_params! {
                    ":start": start,
                    ":end": end,
                    ":agency_id": scope.agency_id,
                    ":excluded": excluded,
                },
                |row| row.get(0),
            )
            .context("count scoped entries")?;
        to_count(count)
    }

    fn entry_counts_by_agency(
        &self,
        window: &PublicationWindow,
    ) -> Result<HashMap<AgencyId, usize>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT assigned.agency_id, COUNT(*)
                 FROM agency_assignments AS assigned
                 JOIN entries ON entries.id = assigned.entry_id
                 WHERE entries.publication_date BETWEEN ?1 AND ?2
                 GROUP BY assigned.agency_id",
            )
            .context("prepare agency facet query")?;

        let rows = stmt
            .query_map(params![window.start_iso(), window.end_iso()], |row| {
                Ok((row.get::<_, AgencyId>(0)?, row.get::<_, i64>(1)?))
            })
            .context("query agency facets")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read agency facets")?;

        rows.into_iter()
            .map(|(id, count)| Ok((id, to_count(count)?)))
            .collect()
    }
}

impl CheckpointStore for SqliteBackend {
    fn last_completed_issue(&self, year: i32, agency_id: AgencyId) -> Result<Option<NaiveDate>> {
        let raw: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT last_completed_issue FROM agency_statuses
                 WHERE year = ?1 AND agency_id = ?2",
                params![year, agency_id],
                |row| row.get(0),
            )
            .optional()
            .context("load last completed issue")?;

        raw.flatten().as_deref().map(stored_date).transpose()
    }

    fn needs_attention_counts(&self, year: i32) -> Result<HashMap<AgencyId, usize>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT agency_id, needs_attention_count FROM agency_statuses
                 WHERE year = ?1 AND needs_attention_count IS NOT NULL",
            )
            .context("prepare needs-attention query")?;

        let rows = stmt
            .query_map([year], |row| {
                Ok((row.get::<_, AgencyId>(0)?, row.get::<_, i64>(1)?))
            })
            .context("query needs-attention counts")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read needs-attention counts")?;

        rows.into_iter()
            .map(|(id, count)| Ok((id, to_count(count)?)))
            .collect()
    }
}

impl AgencyDirectory for SqliteBackend {
    fn agencies_by_ids(&self, ids: &[AgencyId]) -> Result<Vec<Agency>> {
        let ids = serde_json::to_string(ids).context("encode agency ids")?;
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, slug, parent_id FROM agencies
                 WHERE id IN (SELECT value FROM json_each(?1))
                 ORDER BY id",
            )
            .context("prepare agency query")?;

        stmt.query_map([ids], agency_from_row)
            .context("query agencies")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read agencies")
    }

    fn child_agency_ids(&self, parent_id: AgencyId) -> Result<Vec<AgencyId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM agencies WHERE parent_id = ?1 ORDER BY id")
            .context("prepare child agency query")?;

        stmt.query_map([parent_id], |row| row.get(0))
            .context("query child agencies")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read child agencies")
    }

    fn find_agency(&self, key: &str) -> Result<Option<Agency>> {
        if let Ok(id) = key.parse::<AgencyId>() {
            return self
                .conn
                .query_row(
                    "SELECT id, name, slug, parent_id FROM agencies WHERE id = ?1",
                    [id],
                    agency_from_row,
                )
                .optional()
                .context("find agency by id");
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, name, slug, parent_id FROM agencies ORDER BY id")
            .context("prepare agency lookup")?;
        let agencies = stmt
            .query_map([], agency_from_row)
            .context("query agencies")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read agencies")?;

        Ok(agencies.into_iter().find(|agency| agency.to_param() == key))
    }
}

impl StatusCache for SqliteBackend {
    fn write_status(&self, status: &AgencyStatus) -> Result<()> {
        self.upsert_status(status)
    }
}

impl EntryTypeNames for SqliteBackend {}

#[cfg(test)]
mod tests {
    use super::{EntryRecord, SqliteBackend};
    use crate::backend::{
        AgencyDirectory, AgencyStatus, CheckpointStore, EntrySearch, EntryScope, EntryStore,
        StatusCache,
    };
    use crate::model::agency::Agency;
    use crate::model::entry::{Entry, RawValue};
    use crate::model::regulatory_plan::RegulatoryPlan;
    use crate::window::PublicationWindow;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn record(id: i64, published: NaiveDate) -> EntryRecord {
        EntryRecord {
            id,
            title: format!("Title {id}"),
            document_number: format!("2020-{id:05}"),
            publication_date: published,
            toc_subject: None,
            toc_doc: None,
            fr_index_subject: None,
            fr_index_doc: None,
            granule_class: "RULE".to_string(),
            start_page: None,
            end_page: None,
            docket_id: None,
        }
    }

    fn plan(rin: &str, issue: &str, priority: &str, current: bool) -> RegulatoryPlan {
        RegulatoryPlan {
            regulation_id_number: rin.to_string(),
            issue: issue.to_string(),
            title: "Plan".to_string(),
            priority_category: Some(priority.to_string()),
            current,
            elements: BTreeMap::new(),
            contacts: Vec::new(),
        }
    }

    fn seeded() -> SqliteBackend {
        let db = SqliteBackend::open_in_memory().expect("open db");
        db.insert_agency(&Agency::new(1, "Department of Transportation"))
            .expect("agency");
        db.insert_agency(&Agency::new(2, "Federal Aviation Administration").with_parent(1))
            .expect("child agency");
        db.insert_docket("DOT-OST-2020-0001", 12).expect("docket");

        let mut rich = record(10, date(2020, 3, 2));
        rich.toc_subject = Some("Airworthiness".to_string());
        rich.toc_doc = Some("Boeing".to_string());
        rich.fr_index_doc = Some(String::new());
        rich.start_page = Some(100);
        rich.end_page = Some(104);
        rich.docket_id = Some("DOT-OST-2020-0001".to_string());
        db.insert_entry(&rich).expect("entry 10");
        db.insert_public_inspection(10, Some("Airworthiness Directives"), None)
            .expect("public inspection");
        db.insert_comment_close(10, date(2020, 4, 1)).expect("close");
        db.insert_regulatory_plan(&plan("2120-AA01", "201910", "Economically Significant", true))
            .expect("plan");
        db.link_regulation(10, "2120-AA01").expect("link");
        db.link_regulation(10, "2120-ZZ99").expect("dangling link");
        db.assign_agency(10, 1).expect("assign");

        db.insert_entry(&record(11, date(2020, 1, 15))).expect("entry 11");
        db.assign_agency(11, 1).expect("assign");

        db.insert_entry(&record(12, date(2020, 2, 1))).expect("entry 12");
        db.assign_agency(12, 1).expect("assign");
        db.assign_agency(12, 2).expect("assign");

        db.insert_entry(&record(13, date(2019, 12, 31))).expect("entry 13");
        db.assign_agency(13, 1).expect("assign");
        db
    }

    fn scope(excluded: Vec<i64>, window: PublicationWindow) -> EntryScope {
        EntryScope {
            agency_id: 1,
            excluded_agency_ids: excluded,
            window,
        }
    }

    #[test]
    fn fetch_applies_scope_and_order() {
        let db = seeded();
        let rows = db
            .fetch_entries(&scope(vec![2], PublicationWindow::Year(2020)))
            .expect("fetch");
        let ids: Vec<_> = rows.iter().map(|r| r.get("id").clone()).collect();
        assert_eq!(ids, vec![RawValue::Integer(11), RawValue::Integer(10)]);
    }

    #[test]
    fn fetched_rows_coerce_with_joined_fields() {
        let db = seeded();
        let rows = db
            .fetch_entries(&scope(vec![2], PublicationWindow::Year(2020)))
            .expect("fetch");
        let entries: Vec<Entry> = rows
            .iter()
            .map(|r| Entry::from_row(r).expect("coerce"))
            .collect();

        let rich = &entries[1];
        assert_eq!(rich.original_subject.as_deref(), Some("Airworthiness Directives"));
        assert_eq!(rich.original_doc.as_deref(), Some("Boeing"));
        assert_eq!(rich.modified_doc.as_deref(), Some(""));
        assert_eq!(rich.effective_doc(), "");
        assert!(rich.is_modified());
        assert!(rich.is_significant());
        assert_eq!(rich.comment_count, 12);
        assert_eq!(rich.comments_close_on, Some(date(2020, 4, 1)));
        assert_eq!(rich.page_range().as_deref(), Some("100-104"));

        let plain = &entries[0];
        assert_eq!(plain.original_doc.as_deref(), Some("Title 11"));
        assert!(!plain.is_significant());
        assert_eq!(plain.comment_count, 0);
        assert_eq!(plain.start_page, None);
    }

    #[test]
    fn superseded_plans_do_not_mark_significance() {
        let db = seeded();
        db.insert_regulatory_plan(&plan("2120-AA01", "202004", "Substantive, Nonsignificant", true))
            .expect("newer issue");
        let rows = db
            .fetch_entries(&scope(vec![2], PublicationWindow::Year(2020)))
            .expect("fetch");
        let rich = Entry::from_row(&rows[1]).expect("coerce");
        assert!(!rich.is_significant());

        let current = db
            .current_regulatory_plan("2120-AA01")
            .expect("load")
            .expect("current plan");
        assert_eq!(current.issue, "202004");
    }

    #[test]
    fn max_date_window_is_inclusive() {
        let db = seeded();
        let through = PublicationWindow::new(2020, Some(date(2020, 3, 2)));
        assert_eq!(db.count_entries(&scope(vec![2], through)).expect("count"), 2);
        let before = PublicationWindow::new(2020, Some(date(2020, 3, 1)));
        assert_eq!(db.count_entries(&scope(vec![2], before)).expect("count"), 1);
    }

    #[test]
    fn facet_counts_cover_every_assignment() {
        let db = seeded();
        let counts = db
            .entry_counts_by_agency(&PublicationWindow::Year(2020))
            .expect("facets");
        assert_eq!(counts.get(&1), Some(&3));
        assert_eq!(counts.get(&2), Some(&1));
    }

    #[test]
    fn checkpoint_and_status_share_a_row() {
        let db = seeded();
        assert_eq!(db.last_completed_issue(2020, 1).expect("lookup"), None);

        db.set_last_completed_issue(2020, 1, date(2020, 2, 15))
            .expect("checkpoint");
        db.write_status(&AgencyStatus {
            year: 2020,
            agency_id: 1,
            needs_attention_count: 4,
            last_published: Some(date(2020, 3, 2)),
        })
        .expect("status");

        assert_eq!(
            db.last_completed_issue(2020, 1).expect("lookup"),
            Some(date(2020, 2, 15))
        );
        assert_eq!(
            db.needs_attention_counts(2020).expect("counts").get(&1),
            Some(&4)
        );
        assert_eq!(
            db.status(2020, 1).expect("status").map(|s| s.last_published),
            Some(Some(date(2020, 3, 2)))
        );
        assert!(db.needs_attention_counts(2019).expect("counts").is_empty());
    }

    #[test]
    fn checkpoint_alone_leaves_no_cached_count() {
        let db = seeded();
        db.set_last_completed_issue(2020, 1, date(2020, 2, 15))
            .expect("checkpoint");

        assert!(db.needs_attention_counts(2020).expect("counts").is_empty());
        assert!(db.status(2020, 1).expect("status").is_none());
        assert_eq!(
            db.last_completed_issue(2020, 1).expect("lookup"),
            Some(date(2020, 2, 15))
        );
    }

    #[test]
    fn agency_directory_queries() {
        let db = seeded();
        assert_eq!(db.child_agency_ids(1).expect("children"), vec![2]);
        assert!(db.child_agency_ids(2).expect("children").is_empty());

        let agencies = db.agencies_by_ids(&[2, 1, 99]).expect("agencies");
        let ids: Vec<_> = agencies.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(agencies[1].parent_id, Some(1));

        let faa = db
            .find_agency("federal-aviation-administration")
            .expect("lookup")
            .expect("found by slug");
        assert_eq!(faa.id, 2);
        assert_eq!(db.find_agency("2").expect("lookup").map(|a| a.id), Some(2));
        assert!(db.find_agency("nasa").expect("lookup").is_none());
    }

    #[test]
    fn dangling_parent_is_rejected() {
        let db = SqliteBackend::open_in_memory().expect("open db");
        assert!(
            db.insert_agency(&Agency::new(5, "Orphan Office").with_parent(404))
                .is_err()
        );
    }
}
