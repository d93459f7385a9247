//! Unified Agenda regulatory plans.
//!
//! Only the priority category matters to the index (it drives an entry's
//! significance flag). The rest of a plan is carried as element text keyed
//! by XML tag; the constant tables below name which tag backs which field.
//! Pulling that text out of the agenda XML is the loader's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Priority categories that make a linked entry "significant".
pub const SIGNIFICANT_PRIORITY_CATEGORIES: &[&str] =
    &["Economically Significant", "Other Significant"];

/// Single-valued plan fields and their XML element tags.
pub const SINGLE_VALUE_FIELDS: &[(&str, &str)] = &[
    ("statement_of_need", "STMT_OF_NEED"),
    ("legal_basis", "LEGAL_BASIS"),
    ("alternatives", "ALTERNATIVES"),
    ("costs_and_benefits", "COSTS_AND_BENEFITS"),
    ("risks", "RISKS"),
    ("major", "MAJOR"),
    ("regulatory_flexibility_analysis_required", "RFA_REQUIRED"),
    ("energy_affected", "ENERGY_AFFECTED"),
    ("international_interest", "INTERNATIONAL_INTEREST"),
];

/// Multi-valued plan fields and their XML element tags.
pub const MULTI_VALUE_FIELDS: &[(&str, &str)] = &[
    ("small_entities_affected", "SMALL_ENTITY"),
    ("government_levels_affected", "GOVT_LEVEL"),
    ("cfr_citations", "CFR"),
    ("legal_authorizations", "LEGAL_AUTHORITY"),
];

/// Contact fields and their XML element tags.
pub const CONTACT_FIELDS: &[(&str, &str)] = &[
    ("first_name", "FIRST_NAME"),
    ("last_name", "LAST_NAME"),
    ("title", "TITLE"),
    ("agency_name", "AGENCY NAME"),
    ("phone", "PHONE"),
    ("fax", "FAX"),
    ("email", "EMAIL"),
    ("street_address", "STREET_ADDRESS"),
    ("city", "CITY"),
    ("state", "STATE"),
    ("zip", "ZIP"),
];

/// Element tag backing `field` in `table`.
#[must_use]
pub fn element_tag(table: &[(&str, &'static str)], field: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, tag)| *tag)
}

/// Whether a priority category marks a plan as significant.
#[must_use]
pub fn is_significant_priority(category: &str) -> bool {
    SIGNIFICANT_PRIORITY_CATEGORIES.contains(&category)
}

/// Which rendition of the reginfo.gov page to link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Html,
    Xml,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Element tag to text.
    #[serde(default)]
    pub elements: BTreeMap<String, String>,
}

impl Contact {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let tag = element_tag(CONTACT_FIELDS, name)?;
        self.elements.get(tag).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulatoryPlan {
    pub regulation_id_number: String,
    pub issue: String,
    pub title: String,
    #[serde(default)]
    pub priority_category: Option<String>,
    /// Whether this plan belongs to the latest agenda issue.
    #[serde(default = "default_current")]
    pub current: bool,
    /// Element tag to text, one entry per occurrence.
    #[serde(default)]
    pub elements: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl RegulatoryPlan {
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.priority_category
            .as_deref()
            .is_some_and(is_significant_priority)
    }

    /// First text for a single-valued field such as `legal_basis`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let tag = element_tag(SINGLE_VALUE_FIELDS, name)?;
        self.elements.get(tag)?.first().map(String::as_str)
    }

    /// All texts for a multi-valued field such as `cfr_citations`.
    #[must_use]
    pub fn field_values(&self, name: &str) -> &[String] {
        element_tag(MULTI_VALUE_FIELDS, name)
            .and_then(|tag| self.elements.get(tag))
            .map_or(&[], Vec::as_slice)
    }

    /// Lower-case title with `&` spelled out and other punctuation dashed,
    /// capped at 100 characters.
    #[must_use]
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        for ch in self.title.to_lowercase().replace('&', "and").chars() {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
                slug.push(ch);
            } else if !slug.ends_with('-') {
                slug.push('-');
            }
        }
        slug.chars().take(100).collect()
    }

    #[must_use]
    pub fn source_url(&self, format: SourceFormat) -> String {
        let base = format!(
            "http://www.reginfo.gov/public/do/eAgendaViewRule?pubId={}&RIN={}",
            self.issue, self.regulation_id_number
        );
        match format {
            SourceFormat::Html => base,
            SourceFormat::Xml => format!("{base}&operation=OPERATION_EXPORT_XML"),
        }
    }
}

const fn default_current() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(priority: Option<&str>) -> RegulatoryPlan {
        RegulatoryPlan {
            regulation_id_number: "2060-AT99".to_string(),
            issue: "201910".to_string(),
            title: "Air & Water: Standards (Phase 2)".to_string(),
            priority_category: priority.map(str::to_string),
            current: true,
            elements: BTreeMap::new(),
            contacts: Vec::new(),
        }
    }

    #[test]
    fn significance_follows_priority_category() {
        assert!(plan(Some("Economically Significant")).is_significant());
        assert!(plan(Some("Other Significant")).is_significant());
        assert!(!plan(Some("Substantive, Nonsignificant")).is_significant());
        assert!(!plan(None).is_significant());
    }

    #[test]
    fn slug_matches_reginfo_style() {
        assert_eq!(plan(None).slug(), "air-and-water-standards-phase-2-");
    }

    #[test]
    fn source_urls() {
        let plan = plan(None);
        assert_eq!(
            plan.source_url(SourceFormat::Html),
            "http://www.reginfo.gov/public/do/eAgendaViewRule?pubId=201910&RIN=2060-AT99"
        );
        assert!(
            plan.source_url(SourceFormat::Xml)
                .ends_with("&operation=OPERATION_EXPORT_XML")
        );
    }

    #[test]
    fn fields_resolve_through_tag_tables() {
        let mut plan = plan(None);
        plan.elements
            .insert("LEGAL_BASIS".to_string(), vec!["42 U.S.C. 7401".to_string()]);
        plan.elements.insert(
            "CFR".to_string(),
            vec!["40 CFR 52".to_string(), "40 CFR 81".to_string()],
        );
        plan.contacts.push(Contact {
            elements: BTreeMap::from([
                ("FIRST_NAME".to_string(), "Ada".to_string()),
                ("AGENCY NAME".to_string(), "EPA".to_string()),
            ]),
        });

        assert_eq!(plan.field("legal_basis"), Some("42 U.S.C. 7401"));
        assert_eq!(plan.field("risks"), None);
        assert_eq!(plan.field("no_such_field"), None);
        assert_eq!(plan.field_values("cfr_citations").len(), 2);
        assert!(plan.field_values("govt_level").is_empty());
        assert_eq!(plan.contacts[0].field("first_name"), Some("Ada"));
        assert_eq!(plan.contacts[0].field("agency_name"), Some("EPA"));
        assert_eq!(plan.contacts[0].field("email"), None);
    }

    #[test]
    fn tag_tables_have_unique_field_names() {
        for table in [SINGLE_VALUE_FIELDS, MULTI_VALUE_FIELDS, CONTACT_FIELDS] {
            let mut names: Vec<_> = table.iter().map(|(name, _)| *name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), table.len());
        }
    }
}
