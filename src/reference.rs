//! Reference string parsing
//!
//! Turns a free-form reference string such as `"IEC 60950-1:2005"` or
//! `"IEC 61000 (all parts)"` into a structured [`Reference`]. Parsing is total:
//! a string that fits no rule is kept verbatim as the code.

use regex::Regex;
use std::sync::OnceLock;

fn year_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<code>[^:]+):(?P<year>\d{4})\s*$").unwrap())
}

fn all_parts_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*\(\s*all\s*parts\s*\)").unwrap())
}

/// A parsed bibliographic reference query
///
/// Created once per top-level resolution call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Document code, e.g. `"IEC 60950-1"`
    pub code: String,
    /// Requested publication year (4 digits)
    pub year: Option<String>,
    /// True when the query asks for every part of a multi-part standard
    pub all_parts: bool,
    /// Part number, set only when retrying as a packaged standard
    pub part: Option<String>,
}

impl Reference {
    /// Parse a raw reference string
    ///
    /// Rules, applied in order:
    /// 1. `code:year` split when a colon is followed by a 4-digit year and the
    ///    left side is non-empty.
    /// 2. A trailing "(all parts)" marker (case- and spacing-tolerant) sets
    ///    `all_parts` and is stripped from the code.
    /// 3. The code is trimmed; case is preserved (comparisons elsewhere are
    ///    case-insensitive).
    pub fn parse(reference: &str) -> Self {
        // Strip the "(all parts)" suffix before the colon split so a year that
        // precedes the marker is still recognized.
        let mut code = reference.to_string();
        let all_parts = all_parts_re().is_match(&code);
        if all_parts {
            code = all_parts_re().replace_all(&code, "").to_string();
        }

        let mut year = None;
        let unsplit = code.clone();
        if let Some(caps) = year_split_re().captures(&unsplit) {
            let left = caps.name("code").map(|m| m.as_str().trim()).unwrap_or("");
            if !left.is_empty() {
                year = Some(caps["year"].to_string());
                code = left.to_string();
            }
        }

        Self {
            code: code.trim().to_string(),
            year,
            all_parts,
            part: None,
        }
    }

    /// Copy of this reference rewritten for a packaged-part retry
    pub(crate) fn as_packaged_part(&self, base_code: &str, part: &str) -> Self {
        Self {
            code: base_code.to_string(),
            year: self.year.clone(),
            all_parts: self.all_parts,
            part: Some(part.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_with_year() {
        let r = Reference::parse("IEC 60950-1:2005");
        assert_eq!(r.code, "IEC 60950-1");
        assert_eq!(r.year.as_deref(), Some("2005"));
        assert!(!r.all_parts);
        assert!(r.part.is_none());
    }

    #[test]
    fn parses_all_parts_marker() {
        let r = Reference::parse("IEC 61000 (all parts)");
        assert_eq!(r.code, "IEC 61000");
        assert!(r.all_parts);
        assert!(r.year.is_none());
    }

    #[test]
    fn all_parts_marker_is_spacing_and_case_tolerant() {
        for input in ["IEC 61000(all parts)", "IEC 61000 (ALL PARTS)", "IEC 61000 ( all  parts )"] {
            let r = Reference::parse(input);
            assert_eq!(r.code, "IEC 61000", "input: {input}");
            assert!(r.all_parts, "input: {input}");
        }
    }

    #[test]
    fn code_never_contains_all_parts_marker() {
        let r = Reference::parse("IEC 60050:2011 (all parts)");
        assert!(!r.code.to_lowercase().contains("all parts"));
        assert_eq!(r.code, "IEC 60050");
        assert_eq!(r.year.as_deref(), Some("2011"));
        assert!(r.all_parts);
    }

    #[test]
    fn unparsable_string_passes_through() {
        let r = Reference::parse("not a standard code");
        assert_eq!(r.code, "not a standard code");
        assert!(r.year.is_none());
        assert!(!r.all_parts);
    }

    #[test]
    fn colon_without_year_is_kept() {
        let r = Reference::parse("IEC 60050:part");
        assert_eq!(r.code, "IEC 60050:part");
        assert!(r.year.is_none());
    }

    #[test]
    fn empty_left_side_keeps_code() {
        let r = Reference::parse(":2005");
        assert_eq!(r.code, ":2005");
        assert!(r.year.is_none());
    }
}
