//! Similarity predicates shared by observation matching and the detector.

use std::collections::HashSet;

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Two free-text strings are "similar" when, after normalizing, they are
/// exactly equal, one contains the other, or their token sets have a Jaccard
/// similarity (intersection over union) of at least 50%.
#[must_use]
pub fn similar_text(a: &str, b: &str) -> bool {
    let (na, nb) = (normalize(a), normalize(b));
    if na == nb {
        return true;
    }
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    if na.contains(&nb) || nb.contains(&na) {
        return true;
    }
    let (ta, tb) = (token_set(&na), token_set(&nb));
    if ta.is_empty() || tb.is_empty() {
        return false;
    }
    let overlap = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    overlap / union >= 0.5
}

/// Wrap-around aware distance in minutes between two times-of-day, each in
/// `[0, 1440)` minutes since midnight.
#[must_use]
pub fn time_of_day_distance_minutes(a: u32, b: u32) -> u32 {
    let diff = a.abs_diff(b);
    diff.min(1440 - diff)
}

/// Case-insensitive, substring-aware keyword overlap ratio: the fraction of
/// `needle`'s keywords that appear as a substring of some keyword in
/// `haystack`.
#[must_use]
pub fn keyword_overlap_ratio(needle: &[String], haystack: &[String]) -> f64 {
    if needle.is_empty() {
        return 0.0;
    }
    let haystack_lower: Vec<String> = haystack.iter().map(|k| k.to_lowercase()).collect();
    let matches = needle
        .iter()
        .filter(|k| {
            let k = k.to_lowercase();
            haystack_lower.iter().any(|h| h.contains(&k) || k.contains(h.as_str()))
        })
        .count();
    matches as f64 / needle.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_after_normalization() {
        assert!(similar_text("  Check Email  ", "check email"));
    }

    #[test]
    fn substring_containment() {
        assert!(similar_text("check email", "check email inbox"));
    }

    #[test]
    fn jaccard_overlap_at_threshold() {
        assert!(similar_text("review pull request now", "review pull request"));
    }

    #[test]
    fn dissimilar_strings_fail() {
        assert!(!similar_text("deploy service", "write documentation"));
    }

    #[test]
    fn small_token_set_scattered_inside_a_much_larger_one_is_not_similar() {
        // Every word of `needle` appears in `haystack`, but not contiguously,
        // so the overlap coefficient (2/2) and Jaccard (2/10) disagree.
        let needle = "review pull";
        let haystack = "please take time today to carefully review the pull request soon";
        assert!(!similar_text(needle, haystack));
    }

    #[test]
    fn time_distance_wraps_around_midnight() {
        assert_eq!(time_of_day_distance_minutes(10, 1430), 20);
    }

    #[test]
    fn keyword_overlap_counts_substring_matches() {
        let needle = vec!["bug".to_string(), "perf".to_string()];
        let haystack = vec!["bugfix".to_string(), "docs".to_string()];
        assert_eq!(keyword_overlap_ratio(&needle, &haystack), 0.5);
    }
}
