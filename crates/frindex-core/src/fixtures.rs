//! Entry builders shared by unit tests.

use chrono::NaiveDate;

use crate::model::entry::Entry;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn entry(id: i64, granule_class: &str) -> EntryBuilder {
    EntryBuilder {
        entry: Entry {
            id,
            title: format!("Entry {id}"),
            document_number: format!("2020-{id:05}"),
            publication_date: date(2020, 1, 2),
            original_subject: None,
            modified_subject: None,
            original_doc: None,
            modified_doc: None,
            granule_class: granule_class.to_string(),
            start_page: None,
            end_page: None,
            comments_close_on: None,
            significant: false,
            comment_count: 0,
        },
    }
}

pub struct EntryBuilder {
    entry: Entry,
}

impl EntryBuilder {
    pub fn published(mut self, y: i32, m: u32, d: u32) -> Self {
        self.entry.publication_date = date(y, m, d);
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.entry.original_subject = Some(subject.to_string());
        self
    }

    pub fn doc(mut self, doc: &str) -> Self {
        self.entry.original_doc = Some(doc.to_string());
        self
    }

    pub fn modified_subject(mut self, subject: &str) -> Self {
        self.entry.modified_subject = Some(subject.to_string());
        self
    }

    pub fn modified_doc(mut self, doc: &str) -> Self {
        self.entry.modified_doc = Some(doc.to_string());
        self
    }

    pub fn significant(mut self) -> Self {
        self.entry.significant = true;
        self
    }

    pub fn comments(mut self, count: u32) -> Self {
        self.entry.comment_count = count;
        self
    }

    pub fn comments_close(mut self, y: i32, m: u32, d: u32) -> Self {
        self.entry.comments_close_on = Some(date(y, m, d));
        self
    }

    pub fn build(self) -> Entry {
        self.entry
    }
}
