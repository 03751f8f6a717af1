//! Temporal guard: year extraction and cache-match eligibility
//!
//! Embedding similarity alone cannot tell "Apple's 2022 revenue" from
//! "Apple's 2023 revenue". The guard compares the year tokens mentioned by
//! the incoming and cached queries and refuses the match when they disagree.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Four-digit year tokens in 1900-2099
static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d\d|20\d\d)\b").expect("year pattern is valid"));

/// Extract the set of year tokens mentioned in `text`
pub fn extract_years(text: &str) -> BTreeSet<u16> {
    YEAR_PATTERN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Whether a cached query's answer may be served for an incoming query.
///
/// Eligible only when both queries mention no years, or both mention exactly
/// the same years. Any asymmetry or disagreement is treated as a miss, even
/// when embedding similarity passed the threshold. The decision is symmetric
/// in its arguments.
pub fn years_compatible(incoming: &str, cached: &str) -> bool {
    let incoming_years = extract_years(incoming);
    let cached_years = extract_years(cached);

    incoming_years == cached_years
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_years() {
        let years = extract_years("Compare Apple revenue in 2022 and 2023");

        assert_eq!(years, BTreeSet::from([2022, 2023]));
    }

    #[test]
    fn test_extract_years_ignores_out_of_range() {
        assert!(extract_years("in 1899 or 2100 or 12345").is_empty());
    }

    #[test]
    fn test_extract_years_requires_word_boundary() {
        assert!(extract_years("order #20230 shipped").is_empty());
    }

    #[test]
    fn test_both_without_years_eligible() {
        assert!(years_compatible("Apple revenue", "apple total revenue"));
    }

    #[test]
    fn test_same_years_eligible() {
        assert!(years_compatible("Apple revenue 2023", "Apple sales in 2023"));
    }

    #[test]
    fn test_different_years_not_eligible() {
        assert!(!years_compatible("Apple revenue 2022", "Apple revenue 2023"));
    }

    #[test]
    fn test_year_on_one_side_only_not_eligible() {
        assert!(!years_compatible("Apple revenue 2023", "Apple revenue"));
        assert!(!years_compatible("Apple revenue", "Apple revenue 2023"));
    }

    #[test]
    fn test_guard_is_symmetric() {
        let pairs = [
            ("Apple revenue 2022", "Apple revenue 2023"),
            ("Apple revenue", "Apple revenue 2023"),
            ("Apple revenue 2023", "Apple sales 2023"),
            ("Apple revenue", "Apple sales"),
        ];

        for (a, b) in pairs {
            assert_eq!(years_compatible(a, b), years_compatible(b, a));
        }
    }
}
