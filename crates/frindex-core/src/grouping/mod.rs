//! The grouping hierarchy below an agency-year: document type, then subject,
//! then document.
//!
//! Every level is built fresh from its slice of entries and memoizes what it
//! derives (`OnceCell`). Nothing here talks to a store; the checkpoint date
//! is handed down by the agency-year aggregate.
//!
//! # Attention rule
//!
//! A document grouping *needs attention* when none of its entries were
//! published on or before the agency's last completed issue and none of its
//! entries carry an editor override. Without a checkpoint the first half
//! holds trivially, so attention depends only on the override check.
//! Subject groupings and document types report the sum over their children.

pub mod document;
pub mod document_type;
pub mod subject;

pub use document::DocumentGrouping;
pub use document_type::DocumentTypePartition;
pub use subject::SubjectGrouping;

use crate::model::entry::Entry;

/// Identifier-safe token for a grouping: the entry-type code plus a BLAKE3
/// digest of the header. Depends on nothing else, so a grouping can be
/// addressed without rebuilding the aggregation.
#[must_use]
pub fn identifier(granule_class: &str, header: &str) -> String {
    format!("{granule_class}_{}", blake3::hash(header.as_bytes()).to_hex())
}

/// A top-level grouping inside a document type.
#[derive(Debug, Clone)]
pub enum Grouping {
    Subject(SubjectGrouping),
    Document(DocumentGrouping),
}

impl Grouping {
    /// Displayed header: the subject for subject groupings, the document text
    /// for document groupings.
    #[must_use]
    pub fn header(&self) -> &str {
        match self {
            Self::Subject(g) => g.header(),
            Self::Document(g) => g.header(),
        }
    }

    #[must_use]
    pub fn identifier(&self) -> String {
        match self {
            Self::Subject(g) => g.identifier(),
            Self::Document(g) => g.identifier(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        match self {
            Self::Subject(g) => g.entries(),
            Self::Document(g) => g.entries(),
        }
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn needs_attention_count(&self) -> usize {
        match self {
            Self::Subject(g) => g.needs_attention_count(),
            Self::Document(g) => g.needs_attention_count(),
        }
    }

    #[must_use]
    pub fn needs_attention(&self) -> bool {
        self.needs_attention_count() > 0
    }

    #[must_use]
    pub const fn as_subject(&self) -> Option<&SubjectGrouping> {
        match self {
            Self::Subject(g) => Some(g),
            Self::Document(_) => None,
        }
    }

    #[must_use]
    pub const fn as_document(&self) -> Option<&DocumentGrouping> {
        match self {
            Self::Subject(_) => None,
            Self::Document(g) => Some(g),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::identifier;

    #[test]
    fn identifier_is_pure() {
        assert_eq!(identifier("RULE", "Air Programs"), identifier("RULE", "Air Programs"));
        assert!(identifier("RULE", "Air Programs").starts_with("RULE_"));
    }

    #[test]
    fn identifier_depends_on_type_and_header() {
        assert_ne!(identifier("RULE", "Air Programs"), identifier("RULE", "Air programs"));
        assert_ne!(identifier("RULE", "Air Programs"), identifier("NOTICE", "Air Programs"));
    }

    #[test]
    fn identifier_is_token_safe() {
        let id = identifier("PRORULE", "Fish & Wildlife: \"Endangered\" <species>");
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert_eq!(id.len(), "PRORULE_".len() + 64);
    }

    #[test]
    fn empty_header_has_an_identifier() {
        assert!(identifier("NOTICE", "").starts_with("NOTICE_"));
    }
}
