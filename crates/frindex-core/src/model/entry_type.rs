//! Entry-type (granule class) codes and their display names.

/// Known entry-type codes and the label shown for each.
pub const ENTRY_TYPES: &[(&str, &str)] = &[
    ("CORRECT", "Correction"),
    ("NOTICE", "Notice"),
    ("PRESDOCU", "Presidential Document"),
    ("PRORULE", "Proposed Rule"),
    ("RULE", "Rule"),
    ("SUNSHINE", "Sunshine Act Document"),
    ("UNKNOWN", "Uncategorized Document"),
];

/// Display name for an entry-type code. Unknown codes pass through unchanged.
#[must_use]
pub fn display_name(code: &str) -> &str {
    ENTRY_TYPES
        .iter()
        .find(|(known, _)| *known == code)
        .map_or(code, |(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert_eq!(display_name("RULE"), "Rule");
        assert_eq!(display_name("PRORULE"), "Proposed Rule");
        assert_eq!(display_name("PRESDOCU"), "Presidential Document");
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(display_name("ERRATA"), "ERRATA");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = ENTRY_TYPES.iter().map(|(code, _)| *code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ENTRY_TYPES.len());
    }
}
