use serde::{Deserialize, Serialize};

/// Store identifier for an agency.
pub type AgencyId = i64;

/// An agency record as the agency directory returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<AgencyId>,
}

impl Agency {
    #[must_use]
    pub fn new(id: AgencyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slug: None,
            parent_id: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: AgencyId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// First character of the name, used to bucket the index by letter.
    #[must_use]
    pub fn first_letter(&self) -> Option<char> {
        self.name.chars().next()
    }

    /// Slug if set, else one derived from the name.
    #[must_use]
    pub fn to_param(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }
}

/// Lower-case, collapse every run of non-alphanumerics to `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.to_lowercase().replace('&', "and").chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
