//! Bulk loading from a JSON bundle, used by `fri import`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::store::{EntryRecord, SqliteBackend};
use crate::model::agency::{Agency, AgencyId};
use crate::model::regulatory_plan::RegulatoryPlan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocketRecord {
    pub id: String,
    #[serde(default)]
    pub comments_count: u32,
}

/// An entry plus its edges: agencies, regulations, comment close date and
/// public-inspection text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    #[serde(flatten)]
    pub record: EntryRecord,
    #[serde(default)]
    pub agency_ids: Vec<AgencyId>,
    #[serde(default)]
    pub regulation_id_numbers: Vec<String>,
    #[serde(default)]
    pub comments_close_on: Option<NaiveDate>,
    #[serde(default)]
    pub public_inspection_subject: Option<String>,
    #[serde(default)]
    pub public_inspection_doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub year: i32,
    pub agency_id: AgencyId,
    pub last_completed_issue: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub agencies: Vec<Agency>,
    #[serde(default)]
    pub dockets: Vec<DocketRecord>,
    #[serde(default)]
    pub regulatory_plans: Vec<RegulatoryPlan>,
    #[serde(default)]
    pub entries: Vec<ImportEntry>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointRecord>,
}

impl ImportBundle {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid bundle.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub agencies: usize,
    pub dockets: usize,
    pub regulatory_plans: usize,
    pub entries: usize,
    pub checkpoints: usize,
}

impl SqliteBackend {
    /// Load a bundle in one transaction. Nothing is written if any row fails.
    ///
    /// # Errors
    ///
    /// Returns the first failing insert, with context.
    pub fn import(&self, bundle: &ImportBundle) -> Result<ImportSummary> {
        let tx = self
            .connection()
            .unchecked_transaction()
            .context("begin import transaction")?;

        for agency in &bundle.agencies {
            self.insert_agency(agency)?;
        }
        for docket in &bundle.dockets {
            self.insert_docket(&docket.id, docket.comments_count)?;
        }
        for plan in &bundle.regulatory_plans {
            self.insert_regulatory_plan(plan)?;
        }
        for entry in &bundle.entries {
            self.import_entry(entry)?;
        }
        for checkpoint in &bundle.checkpoints {
            self.set_last_completed_issue(
                checkpoint.year,
                checkpoint.agency_id,
                checkpoint.last_completed_issue,
            )?;
        }

        tx.commit().context("commit import")?;

        let summary = ImportSummary {
            agencies: bundle.agencies.len(),
            dockets: bundle.dockets.len(),
            regulatory_plans: bundle.regulatory_plans.len(),
            entries: bundle.entries.len(),
            checkpoints: bundle.checkpoints.len(),
        };
        info!(?summary, "imported bundle");
        Ok(summary)
    }

    fn import_entry(&self, entry: &ImportEntry) -> Result<()> {
        let id = entry.record.id;
        self.insert_entry(&entry.record)?;
        for agency_id in &entry.agency_ids {
            self.assign_agency(id, *agency_id)?;
        }
        for rin in &entry.regulation_id_numbers {
            self.link_regulation(id, rin)?;
        }
        if let Some(closes_on) = entry.comments_close_on {
            self.insert_comment_close(id, closes_on)?;
        }
        if entry.public_inspection_subject.is_some() || entry.public_inspection_doc.is_some() {
            self.insert_public_inspection(
                id,
                entry.public_inspection_subject.as_deref(),
                entry.public_inspection_doc.as_deref(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ImportBundle;
    use crate::backend::{AgencyDirectory, CheckpointStore, EntrySearch};
    use crate::db::SqliteBackend;
    use crate::window::PublicationWindow;
    use chrono::NaiveDate;

    const BUNDLE: &str = r#"{
        "agencies": [
            {"id": 2, "name": "Bureau of Land Management", "parent_id": 1},
            {"id": 1, "name": "Interior Department", "slug": "interior"}
        ],
        "dockets": [{"id": "BLM-2020-0001", "comments_count": 3}],
        "regulatory_plans": [
            {"regulation_id_number": "1004-AE60", "issue": "202004",
             "title": "Waste Prevention", "priority_category": "Other Significant"}
        ],
        "entries": [
            {"id": 1, "document_number": "2020-00001", "publication_date": "2020-05-04",
             "granule_class": "PRORULE", "toc_subject": "Oil and gas",
             "docket_id": "BLM-2020-0001", "agency_ids": [1, 2],
             "regulation_id_numbers": ["1004-AE60"], "comments_close_on": "2020-07-06"},
            {"id": 2, "document_number": "2020-00002", "publication_date": "2020-06-01",
             "granule_class": "NOTICE", "agency_ids": [1],
             "public_inspection_doc": "Meeting notice"}
        ],
        "checkpoints": [
            {"year": 2020, "agency_id": 1, "last_completed_issue": "2020-05-15"}
        ]
    }"#;

    #[test]
    fn bundle_loads_in_dependency_order() {
        let bundle: ImportBundle = serde_json::from_str(BUNDLE).expect("parse bundle");
        let db = SqliteBackend::open_in_memory().expect("open db");
        let summary = db.import(&bundle).expect("import");

        assert_eq!(summary.agencies, 2);
        assert_eq!(summary.entries, 2);
        assert_eq!(db.child_agency_ids(1).expect("children"), vec![2]);
        assert_eq!(
            db.find_agency("interior").expect("lookup").map(|a| a.id),
            Some(1)
        );
        assert_eq!(
            db.last_completed_issue(2020, 1).expect("checkpoint"),
            NaiveDate::from_ymd_opt(2020, 5, 15)
        );
        let counts = db
            .entry_counts_by_agency(&PublicationWindow::Year(2020))
            .expect("facets");
        assert_eq!(counts.get(&1), Some(&2));
    }

    #[test]
    fn failed_import_writes_nothing() {
        let mut bundle: ImportBundle = serde_json::from_str(BUNDLE).expect("parse bundle");
        bundle.entries[1].agency_ids.push(404);

        let db = SqliteBackend::open_in_memory().expect("open db");
        assert!(db.import(&bundle).is_err());
        assert!(db.agencies_by_ids(&[1, 2]).expect("query").is_empty());
    }

    #[test]
    fn from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bundle.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = ImportBundle::from_path(&path).expect_err("invalid json");
        assert!(err.to_string().contains("Failed to parse"));
    }
}
