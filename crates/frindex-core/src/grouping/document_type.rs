use chrono::NaiveDate;
use std::cell::OnceCell;
use std::collections::BTreeMap;

use super::subject::group_by_doc;
use super::{DocumentGrouping, Grouping, SubjectGrouping};
use crate::model::entry::Entry;

/// All of an agency-year's entries of one entry type.
///
/// Entries with a subject become subject groupings; entries without one
/// become top-level document groupings. Both kinds are merged and ordered by
/// their displayed header.
#[derive(Debug, Clone)]
pub struct DocumentTypePartition {
    granule_class: String,
    name: String,
    entries: Vec<Entry>,
    last_completed_issue: Option<NaiveDate>,
    groupings: OnceCell<Vec<Grouping>>,
}

impl DocumentTypePartition {
    #[must_use]
    pub fn new(
        granule_class: impl Into<String>,
        name: impl Into<String>,
        entries: Vec<Entry>,
        last_completed_issue: Option<NaiveDate>,
    ) -> Self {
        Self {
            granule_class: granule_class.into(),
            name: name.into(),
            entries,
            last_completed_issue,
            groupings: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn granule_class(&self) -> &str {
        &self.granule_class
    }

    /// Display name for the entry type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub const fn last_completed_issue(&self) -> Option<NaiveDate> {
        self.last_completed_issue
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn grouping_count(&self) -> usize {
        self.groupings().len()
    }

    /// Subject and document groupings, sorted by header (ordinal).
    pub fn groupings(&self) -> &[Grouping] {
        self.groupings.get_or_init(|| {
            let mut groupings: Vec<Grouping> = self
                .subject_groupings()
                .into_iter()
                .map(Grouping::Subject)
                .chain(self.document_groupings().into_iter().map(Grouping::Document))
                .collect();
            groupings.sort_by(|a, b| a.header().cmp(b.header()));
            groupings
        })
    }

    /// First grouping whose displayed header equals `header`.
    #[must_use]
    pub fn grouping(&self, header: &str) -> Option<&Grouping> {
        self.groupings().iter().find(|g| g.header() == header)
    }

    #[must_use]
    pub fn needs_attention_count(&self) -> usize {
        self.groupings()
            .iter()
            .map(Grouping::needs_attention_count)
            .sum()
    }

    fn subject_groupings(&self) -> Vec<SubjectGrouping> {
        let mut by_subject: BTreeMap<&str, Vec<Entry>> = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| !e.has_blank_subject()) {
            by_subject
                .entry(entry.effective_subject())
                .or_default()
                .push(entry.clone());
        }

        by_subject
            .into_iter()
            .map(|(subject, entries)| {
                SubjectGrouping::new(
                    self.granule_class.clone(),
                    subject,
                    entries,
                    self.last_completed_issue,
                )
            })
            .collect()
    }

    fn document_groupings(&self) -> Vec<DocumentGrouping> {
        let unfiled: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| e.has_blank_subject())
            .cloned()
            .collect();

        group_by_doc(&unfiled)
            .into_iter()
            .map(|(doc, entries)| {
                DocumentGrouping::new(
                    self.granule_class.clone(),
                    doc,
                    entries,
                    None,
                    self.last_completed_issue,
                )
            })
            .collect()
    }
}
