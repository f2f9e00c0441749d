//! Deterministic, syntax-free heuristics over source text. Language-agnostic
//! by design; defaults are tuned for typed curly-brace languages but nothing
//! here parses a grammar.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct SafetyReport {
    pub safe: bool,
    pub issues: Vec<String>,
}

fn dangerous_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)\beval\s*\(").unwrap(),
            Regex::new(r"(?i)\bnew\s+Function\s*\(").unwrap(),
            Regex::new(r"(?i)\bexec\s*\(").unwrap(),
            Regex::new(r#"(?i)\b(?:child_process|std::process)\s*::?\s*(?:Command|spawn|exec)"#).unwrap(),
        ]
    })
}

/// Flags dynamic code construction (a callable whose body is a string at the
/// call site) and obvious process-spawning hooks.
#[must_use]
pub fn check_dangerous_ops(source: &str) -> SafetyReport {
    let mut issues = Vec::new();
    for pattern in dangerous_patterns() {
        if let Some(m) = pattern.find(source) {
            issues.push(format!("dangerous construct matched: {}", m.as_str()));
        }
    }
    SafetyReport { safe: issues.is_empty(), issues }
}

fn secret_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?i)\b(?:api[_-]?key|secret|token|password|access[_-]?key)\w*\s*[:=]\s*["']([A-Za-z0-9+/_\-]{16,})["']"#,
        )
        .unwrap()
    })
}

fn env_read_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?i)(?:std::)?env::var|process\.env"#).unwrap())
}

/// Sweeps for long opaque-looking literals assigned to key/token-sounding
/// identifiers; excludes environment-variable reads from consideration.
#[must_use]
pub fn check_secrets_exposed(source: &str) -> SafetyReport {
    let mut issues = Vec::new();
    for line in source.lines() {
        if env_read_pattern().is_match(line) {
            continue;
        }
        if let Some(caps) = secret_pattern().captures(line) {
            let literal = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            issues.push(format!("possible secret literal assigned: {}...", &literal[..literal.len().min(6)]));
        }
    }
    SafetyReport { safe: issues.is_empty(), issues }
}

#[derive(Debug, Clone, Copy)]
pub struct ComplexityEstimate {
    pub average: f64,
    pub max: f64,
    pub score: f64,
}

fn branch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(if|else if|match|for|while|loop|catch|case|&&|\|\|)\b").unwrap())
}

fn function_boundaries(source: &str) -> Vec<&str> {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }
    vec![source]
}

/// Counts branching/loop constructs. With no function boundaries detected
/// the whole file is treated as a single unit.
#[must_use]
pub fn estimate_complexity(source: &str) -> ComplexityEstimate {
    let units = function_boundaries(source);
    if units.is_empty() {
        return ComplexityEstimate { average: 0.0, max: 0.0, score: 1.0 };
    }
    let counts: Vec<usize> = units
        .iter()
        .map(|unit| branch_pattern().find_iter(unit).count())
        .collect();
    let max = counts.iter().copied().max().unwrap_or(0) as f64;
    let average = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    let score = (1.0 - (average / 20.0).min(1.0)) * (1.0 - (max / 40.0).min(1.0));
    ComplexityEstimate { average, max, score: score.clamp(0.0, 1.0) }
}

fn normalize_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with('*') {
        return None;
    }
    Some(trimmed.to_string())
}

/// Fraction of normalized lines that recur elsewhere in the same source,
/// via 3-line n-gram hashing.
#[must_use]
pub fn estimate_duplication(source: &str) -> f64 {
    const NGRAM: usize = 3;
    let lines: Vec<String> = source.lines().filter_map(normalize_line).collect();
    if lines.len() < NGRAM {
        return 0.0;
    }
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicated = 0usize;
    let mut total = 0usize;
    for window in lines.windows(NGRAM) {
        let key = window.join("\u{1}");
        total += 1;
        if !seen.insert(key) {
            duplicated += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        duplicated as f64 / total as f64
    }
}

/// Fraction of lines that are comments, in [0,1].
#[must_use]
pub fn comment_ratio(source: &str) -> f64 {
    let total = source.lines().filter(|l| !l.trim().is_empty()).count();
    if total == 0 {
        return 0.0;
    }
    let comments = source
        .lines()
        .filter(|l| {
            let t = l.trim();
            t.starts_with("//") || t.starts_with('#') || t.starts_with("/*") || t.starts_with('*')
        })
        .count();
    comments as f64 / total as f64
}

#[derive(Debug, Clone, Copy)]
pub struct SizeMetrics {
    pub lines_added: usize,
    pub lines_removed: usize,
    pub net_change: i64,
    pub score: f64,
}

const SIZE_SCORE_CEILING: f64 = 500.0;

/// Small changes are favored: `score` decays toward 0 as `|net_change|`
/// grows, reaching 0 at `SIZE_SCORE_CEILING` lines.
#[must_use]
pub fn size_metrics(lines_added: usize, lines_removed: usize) -> SizeMetrics {
    let net_change = lines_added as i64 - lines_removed as i64;
    let score = (1.0 - (net_change.unsigned_abs() as f64 / SIZE_SCORE_CEILING).min(1.0)).clamp(0.0, 1.0);
    SizeMetrics { lines_added, lines_removed, net_change, score }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangerous_ops_flags_eval() {
        let report = check_dangerous_ops("let x = eval(user_input);");
        assert!(!report.safe);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn dangerous_ops_clean_source_is_safe() {
        let report = check_dangerous_ops("fn add(a: i32, b: i32) -> i32 { a + b }");
        assert!(report.safe);
    }

    #[test]
    fn secrets_flags_literal_assignment() {
        let report = check_secrets_exposed(r#"let api_key = "abcdefghijklmnopqrstuvwxyz";"#);
        assert!(!report.safe);
    }

    #[test]
    fn secrets_excludes_env_reads() {
        let report = check_secrets_exposed(r#"let token = std::env::var("API_TOKEN").unwrap();"#);
        assert!(report.safe);
    }

    #[test]
    fn complexity_increases_with_branching() {
        let simple = estimate_complexity("fn f() { 1 + 1; }");
        let branchy = estimate_complexity(
            "fn f(x: i32) -> i32 { if x > 0 { if x > 10 { for i in 0..x { if i % 2 == 0 { } } } } x }",
        );
        assert!(simple.score > branchy.score);
    }

    #[test]
    fn duplication_detects_repeated_lines() {
        let source = "let a = 1;\nlet b = 2;\nlet c = 3;\nlet a = 1;\nlet b = 2;\nlet c = 3;\n";
        let ratio = estimate_duplication(source);
        assert!(ratio > 0.0);
    }

    #[test]
    fn duplication_zero_for_unique_lines() {
        let source = "let a = 1;\nlet b = 2;\nlet c = 3;\n";
        assert_eq!(estimate_duplication(source), 0.0);
    }

    #[test]
    fn comment_ratio_counts_comment_lines() {
        let source = "// header\nlet a = 1;\n// trailer\n";
        let ratio = comment_ratio(source);
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn size_metrics_small_change_scores_high() {
        let metrics = size_metrics(5, 2);
        assert_eq!(metrics.net_change, 3);
        assert!(metrics.score > 0.9);
    }

    #[test]
    fn size_metrics_large_change_scores_low() {
        let metrics = size_metrics(1000, 0);
        assert_eq!(metrics.score, 0.0);
    }
}
