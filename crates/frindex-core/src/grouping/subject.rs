use chrono::NaiveDate;
use std::cell::OnceCell;
use std::collections::BTreeMap;

use super::DocumentGrouping;
use crate::model::entry::Entry;

/// Entries that share an effective subject, sub-grouped by document.
#[derive(Debug, Clone)]
pub struct SubjectGrouping {
    granule_class: String,
    header: String,
    entries: Vec<Entry>,
    last_completed_issue: Option<NaiveDate>,
    document_groupings: OnceCell<Vec<DocumentGrouping>>,
}

impl SubjectGrouping {
    #[must_use]
    pub fn new(
        granule_class: impl Into<String>,
        header: impl Into<String>,
        entries: Vec<Entry>,
        last_completed_issue: Option<NaiveDate>,
    ) -> Self {
        Self {
            granule_class: granule_class.into(),
            header: header.into(),
            entries,
            last_completed_issue,
            document_groupings: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub fn granule_class(&self) -> &str {
        &self.granule_class
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Child groupings keyed on effective document text, in ascending order.
    pub fn document_groupings(&self) -> &[DocumentGrouping] {
        self.document_groupings.get_or_init(|| {
            group_by_doc(&self.entries)
                .into_iter()
                .map(|(doc, entries)| {
                    DocumentGrouping::new(
                        self.granule_class.clone(),
                        doc,
                        entries,
                        Some(self.header.clone()),
                        self.last_completed_issue,
                    )
                })
                .collect()
        })
    }

    #[must_use]
    pub fn needs_attention_count(&self) -> usize {
        self.document_groupings()
            .iter()
            .map(DocumentGrouping::needs_attention_count)
            .sum()
    }

    #[must_use]
    pub fn needs_attention(&self) -> bool {
        self.needs_attention_count() > 0
    }

    #[must_use]
    pub fn identifier(&self) -> String {
        super::identifier(&self.granule_class, &self.header)
    }
}

/// Group entries by effective document text, keeping each group's entries in
/// their original order.
pub(crate) fn group_by_doc(entries: &[Entry]) -> BTreeMap<String, Vec<Entry>> {
    let mut groups: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry(entry.effective_doc().to_string())
            .or_default()
            .push(entry.clone());
    }
    groups
}
