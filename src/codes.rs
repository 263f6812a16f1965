//! Document code extraction and comparison
//!
//! A raw candidate code such as `"ISO/IEC 27001:2013+AMD1/AMD 2"` is broken
//! into a [`PubCode`] (family, number, part, year, bundle, corrigendum) and
//! compared against the parsed query under the code/year/part/bundle/
//! corrigendum rules. Candidates are filtered stably: the output order is
//! always the original search-page order.

use crate::reference::Reference;
use regex::Regex;
use std::sync::OnceLock;

fn pub_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)^
              (?P<family>(?:ISO|IEC)(?:[\s/](?:ISO|IEC))*)
              \s+
              (?P<number>\d+)
              (?:-(?P<part>[0-9A-Za-z]+(?:-[0-9A-Za-z]+)*))?
              (?::(?P<year>\d{4}))?
              (?:\+(?P<bundle>[^/\s]+))?
              (?:/(?P<corr>(?:AMD|COR)\s*\d+))?",
        )
        .unwrap()
    })
}

/// Structured fields extracted from one raw document code
///
/// Recomputed per comparison, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubCode {
    /// Publisher family token, uppercased: `"IEC"`, `"ISO"`, `"ISO/IEC"`
    pub family: String,
    /// Numeric document id, e.g. `"60950"`
    pub number: String,
    /// Dash part, e.g. `"1"` in `"IEC 60950-1"`
    pub part: Option<String>,
    /// Edition year from a `:YYYY` suffix
    pub year: Option<String>,
    /// Co-published companion token from a `+` suffix
    pub bundle: Option<String>,
    /// Amendment/corrigendum token, whitespace-normalized: `"AMD1"`, `"COR2"`
    pub corrigendum: Option<String>,
}

impl PubCode {
    /// Extract the structured fields from a raw code string
    ///
    /// Returns `None` when the string has no recognizable family+number head.
    pub fn extract(raw: &str) -> Option<Self> {
        let caps = pub_code_re().captures(raw.trim())?;

        let family = caps["family"]
            .to_uppercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("/")
            .replace("//", "/");

        Some(Self {
            family,
            number: caps["number"].to_string(),
            part: caps.name("part").map(|m| m.as_str().to_string()),
            year: caps.name("year").map(|m| m.as_str().to_string()),
            bundle: caps.name("bundle").map(|m| m.as_str().to_uppercase()),
            corrigendum: caps
                .name("corr")
                .map(|m| m.as_str().split_whitespace().collect::<String>().to_uppercase()),
        })
    }
}

/// Does a candidate's raw code satisfy the parsed query?
///
/// Comparison policy:
/// - Packaged-part retry (`reference.part` set): the candidate's part is
///   truncated to its leading digit, so sub-part digits and letters are
///   ignored. The query code was already rewritten to the single-digit base.
/// - `all_parts`: the part component is ignored on both sides.
/// - Otherwise family, number and part must all agree; the year must agree
///   when both sides carry one (the query's year may still sit inside its
///   code when an amendment or bundle suffix follows the `:YYYY`); bundle
///   and corrigendum tokens must be equal.
/// - When either side fails structured extraction, fall back to a
///   case-insensitive prefix comparison on the raw strings.
pub fn code_matches(reference: &Reference, candidate_code: &str) -> bool {
    let query = PubCode::extract(&reference.code);
    let candidate = PubCode::extract(candidate_code);

    let (query, candidate) = match (query, candidate) {
        (Some(q), Some(c)) => (q, c),
        _ => {
            let q = reference.code.trim().to_lowercase();
            let c = candidate_code.trim().to_lowercase();
            return !q.is_empty() && c.starts_with(&q);
        }
    };

    if query.family != candidate.family || query.number != candidate.number {
        return false;
    }

    // Packaged-part stripping first, then all-parts stripping. The two rules
    // only interact for a reference that is both packaged and all-parts; the
    // precedence here is a documented deterministic choice.
    let query_part = query.part.clone();
    let candidate_part = if reference.part.is_some() {
        candidate.part.as_deref().map(leading_digit)
    } else {
        candidate.part.clone()
    };

    if !reference.all_parts && query_part != candidate_part {
        return false;
    }

    // A suffix such as "/AMD 1" keeps the :YYYY inside the code, so the
    // extracted query year stands in when the outer split found none.
    let requested_year = reference.year.as_deref().or(query.year.as_deref());
    if let Some(year) = requested_year {
        if candidate.year.as_deref().is_some_and(|y| y != year) {
            return false;
        }
    }

    query.bundle == candidate.bundle && query.corrigendum == candidate.corrigendum
}

fn leading_digit(part: &str) -> String {
    part.chars().take(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(code: &str) -> Reference {
        Reference::parse(code)
    }

    #[test]
    fn extracts_full_code() {
        let code = PubCode::extract("ISO/IEC 27001:2013+AMD1/AMD 2").unwrap();
        assert_eq!(code.family, "ISO/IEC");
        assert_eq!(code.number, "27001");
        assert!(code.part.is_none());
        assert_eq!(code.year.as_deref(), Some("2013"));
        assert_eq!(code.bundle.as_deref(), Some("AMD1"));
        assert_eq!(code.corrigendum.as_deref(), Some("AMD2"));
    }

    #[test]
    fn extracts_dash_part() {
        let code = PubCode::extract("IEC 60950-1:2005").unwrap();
        assert_eq!(code.family, "IEC");
        assert_eq!(code.number, "60950");
        assert_eq!(code.part.as_deref(), Some("1"));
        assert_eq!(code.year.as_deref(), Some("2005"));
    }

    #[test]
    fn extraction_is_case_insensitive() {
        let code = PubCode::extract("iec 61000-4-2").unwrap();
        assert_eq!(code.family, "IEC");
        assert_eq!(code.part.as_deref(), Some("4-2"));
    }

    #[test]
    fn corrigendum_whitespace_is_normalized() {
        let spaced = PubCode::extract("IEC 60601-1/AMD 1").unwrap();
        let tight = PubCode::extract("IEC 60601-1/AMD1").unwrap();
        assert_eq!(spaced.corrigendum, tight.corrigendum);
    }

    #[test]
    fn unrecognized_code_yields_none() {
        assert!(PubCode::extract("completely unrelated").is_none());
        assert!(PubCode::extract("BS 1363").is_none());
    }

    #[test]
    fn exact_code_matches() {
        let r = reference("IEC 60950-1");
        assert!(code_matches(&r, "IEC 60950-1:2005"));
        assert!(code_matches(&r, "iec 60950-1"));
        assert!(!code_matches(&r, "IEC 60950-2"));
        assert!(!code_matches(&r, "IEC 60951-1"));
    }

    #[test]
    fn year_must_agree_when_both_present() {
        let r = reference("IEC 60950-1:2005");
        assert!(code_matches(&r, "IEC 60950-1:2005"));
        assert!(!code_matches(&r, "IEC 60950-1:2013"));
        // A candidate without a year is resolved later from its fetched record.
        assert!(code_matches(&r, "IEC 60950-1"));
    }

    #[test]
    fn embedded_year_before_amendment_must_agree() {
        // The :YYYY cannot be split out of the reference when an amendment
        // suffix follows it, but it still constrains the candidate's year.
        let r = reference("IEC 60027-1:1992/AMD 1");
        assert!(r.year.is_none());
        assert!(code_matches(&r, "IEC 60027-1:1992/AMD1"));
        assert!(!code_matches(&r, "IEC 60027-1:2005/AMD1"));

        let bundled = reference("IEC 61058-1:2000+AMD1");
        assert!(code_matches(&bundled, "IEC 61058-1:2000+AMD1"));
        assert!(!code_matches(&bundled, "IEC 61058-1:2010+AMD1"));
    }

    #[test]
    fn bundle_token_must_agree() {
        let r = reference("IEC 61058-1:2000+AMD1");
        assert!(code_matches(&r, "IEC 61058-1:2000+AMD1"));
        assert!(!code_matches(&r, "IEC 61058-1:2000"));
        assert!(!code_matches(&reference("IEC 61058-1:2000"), "IEC 61058-1:2000+AMD1"));
    }

    #[test]
    fn corrigendum_token_must_agree() {
        let r = reference("IEC 60601-1/AMD 1");
        assert!(code_matches(&r, "IEC 60601-1/AMD1"));
        assert!(!code_matches(&r, "IEC 60601-1"));
        assert!(!code_matches(&r, "IEC 60601-1/AMD2"));
    }

    #[test]
    fn all_parts_ignores_part_component() {
        let mut r = reference("IEC 61000 (all parts)");
        assert!(r.all_parts);
        assert!(code_matches(&r, "IEC 61000-1"));
        assert!(code_matches(&r, "IEC 61000-2"));
        assert!(code_matches(&r, "IEC 61000-4-2"));
        r.all_parts = false;
        assert!(!code_matches(&r, "IEC 61000-1"));
    }

    #[test]
    fn packaged_part_ignores_sub_part_digits() {
        // Retry of "IEC 60050-311": base "IEC 60050-3", part "311". The
        // packaged edition is published as e.g. "IEC 60050-300".
        let r = reference("IEC 60050-3").as_packaged_part("IEC 60050-3", "311");
        assert!(code_matches(&r, "IEC 60050-300:2001"));
        assert!(code_matches(&r, "IEC 60050-311"));
        assert!(!code_matches(&r, "IEC 60050-400"));
    }

    #[test]
    fn unparsable_query_falls_back_to_prefix_compare() {
        let r = reference("BS 1363");
        assert!(code_matches(&r, "bs 1363-2"));
        assert!(!code_matches(&r, "EN 50075"));
    }
}
