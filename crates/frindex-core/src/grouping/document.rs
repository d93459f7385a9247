use chrono::NaiveDate;
use std::cell::OnceCell;

use crate::model::entry::Entry;

/// Entries that share an effective document description.
///
/// Top-level document groupings live directly under a document type (their
/// entries have no subject); nested ones live under a subject grouping and
/// remember that subject as `parent_subject`.
#[derive(Debug, Clone)]
pub struct DocumentGrouping {
    granule_class: String,
    header: String,
    entries: Vec<Entry>,
    parent_subject: Option<String>,
    last_completed_issue: Option<NaiveDate>,
    needs_attention: OnceCell<bool>,
}

impl DocumentGrouping {
    #[must_use]
    pub fn new(
        granule_class: impl Into<String>,
        header: impl Into<String>,
        entries: Vec<Entry>,
        parent_subject: Option<String>,
        last_completed_issue: Option<NaiveDate>,
    ) -> Self {
        Self {
            granule_class: granule_class.into(),
            header: header.into(),
            entries,
            parent_subject,
            last_completed_issue,
            needs_attention: OnceCell::new(),
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
    pub fn parent_subject(&self) -> Option<&str> {
        self.parent_subject.as_deref()
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
    pub fn comments_open(&self) -> bool {
        self.entries.iter().any(Entry::comments_open)
    }

    #[must_use]
    pub fn comments_open_on(&self, date: NaiveDate) -> bool {
        self.entries.iter().any(|e| e.comments_open_on(date))
    }

    #[must_use]
    pub fn has_comments(&self) -> bool {
        self.entries.iter().any(|e| e.comment_count > 0)
    }

    #[must_use]
    pub fn significant(&self) -> bool {
        self.entries.iter().any(Entry::is_significant)
    }

    /// No entry is older than the checkpoint and no entry was modified.
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        *self
            .needs_attention
            .get_or_init(|| self.old_entry_count() == 0 && self.unmodified())
    }

    #[must_use]
    pub fn needs_attention_count(&self) -> usize {
        usize::from(self.needs_attention())
    }

    #[must_use]
    pub fn identifier(&self) -> String {
        super::identifier(&self.granule_class, &self.header)
    }

    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_subject
            .as_deref()
            .is_none_or(|subject| subject.trim().is_empty())
    }

    /// The header shown at the top of the index: this grouping's own header
    /// when it is top-level, otherwise its parent subject.
    #[must_use]
    pub fn top_level_header(&self) -> &str {
        if self.is_top_level() {
            &self.header
        } else {
            self.parent_subject.as_deref().unwrap_or(&self.header)
        }
    }

    fn old_entry_count(&self) -> usize {
        self.last_completed_issue.map_or(0, |checkpoint| {
            self.entries
                .iter()
                .filter(|e| e.publication_date <= checkpoint)
                .count()
        })
    }

    fn unmodified(&self) -> bool {
        !self.entries.iter().any(Entry::is_modified)
    }
}
