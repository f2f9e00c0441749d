//! Confidence parsing: a heuristic over free-form sub-agent output.
//!
//! Absence of a match is a neutral signal, never a failure — callers treat
//! `None` as "the sub-agent didn't report a number", not as an error.

use regex::Regex;
use std::sync::OnceLock;

fn patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)confidence:\s*(\d+(?:\.\d+)?)%").unwrap(),
            Regex::new(r"(?i)confidence:\s*(\d+(?:\.\d+)?)").unwrap(),
            Regex::new(r"(?i)confidence\s+score:\s*(\d+(?:\.\d+)?)").unwrap(),
        ]
    })
}

/// Try each pattern in order; the first hit wins. A raw number greater than
/// 1 is assumed to be a percentage and divided by 100.
#[must_use]
pub fn parse_confidence(output: &str) -> Option<f64> {
    for pattern in patterns() {
        if let Some(caps) = pattern.captures(output) {
            let raw: f64 = caps.get(1)?.as_str().parse().ok()?;
            return Some(if raw > 1.0 { raw / 100.0 } else { raw });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_form() {
        assert_eq!(parse_confidence("Confidence: 85%"), Some(0.85));
    }

    #[test]
    fn bare_integer_over_one_is_percent() {
        assert_eq!(parse_confidence("confidence: 70"), Some(0.70));
    }

    #[test]
    fn fractional_form_is_already_normalized() {
        assert_eq!(parse_confidence("confidence: 0.42"), Some(0.42));
    }

    #[test]
    fn score_suffix_form() {
        assert_eq!(parse_confidence("Confidence Score: 90"), Some(0.90));
    }

    #[test]
    fn absence_is_none() {
        assert_eq!(parse_confidence("no signal here"), None);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(parse_confidence("CONFIDENCE: 50%"), Some(0.5));
    }
}
