//! Ranking of [`SolutionEvaluation`]s and the auto-accept gate.

use crate::types::{RankedSolution, SolutionEvaluation, SolutionRanking};

const TIE_EPSILON: f64 = 0.01;

fn strengths_for(evaluation: &SolutionEvaluation) -> Vec<String> {
    let mut strengths = Vec::new();
    if evaluation.correctness.check_is_true("tests") || evaluation.correctness.overall >= 0.95 {
        strengths.push("All tests pass".to_string());
    }
    if evaluation.correctness.check_is_true("typecheck") && evaluation.correctness.check_is_true("lint") {
        strengths.push("Clean type check and lint".to_string());
    }
    if evaluation.safety.check_is_true("no_dangerous_ops") && evaluation.safety.check_is_true("no_secrets_exposed") {
        strengths.push("No safety issues detected".to_string());
    }
    if evaluation.completeness.check_is_true("documentation_added") {
        strengths.push("Documentation included".to_string());
    }
    strengths
}

fn weaknesses_for(evaluation: &SolutionEvaluation) -> Vec<String> {
    let mut weaknesses = Vec::new();
    if let Some(check) = evaluation.correctness.check("lint") {
        if check.as_bool() == Some(false) {
            weaknesses.push("Lint errors present".to_string());
        }
    }
    if let Some(check) = evaluation.completeness.check("documentation_added") {
        if check.as_bool() == Some(false) {
            weaknesses.push("Missing documentation".to_string());
        }
    }
    if let Some(check) = evaluation.safety.check("no_dangerous_ops") {
        if check.as_bool() == Some(false) {
            weaknesses.push("Dangerous operations detected".to_string());
        }
    }
    if let Some(check) = evaluation.safety.check("no_secrets_exposed") {
        if check.as_bool() == Some(false) {
            weaknesses.push("Possible secret exposure".to_string());
        }
    }
    if let Some(check) = evaluation.completeness.check("changelog_updated") {
        if check.as_bool() == Some(false) {
            weaknesses.push("Changelog not updated".to_string());
        }
    }
    weaknesses
}

/// Sort by `overall_score` descending; ties broken by `correctness.overall`,
/// then `safety.overall`, then input order (stable sort).
#[must_use]
pub fn rank_solutions(evaluations: Vec<SolutionEvaluation>) -> SolutionRanking {
    let mut indexed: Vec<(usize, SolutionEvaluation)> = evaluations.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.correctness.overall.partial_cmp(&a.correctness.overall).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| b.safety.overall.partial_cmp(&a.safety.overall).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| ia.cmp(ib))
    });

    let solutions: Vec<RankedSolution> = indexed
        .into_iter()
        .enumerate()
        .map(|(rank, (_, evaluation))| RankedSolution {
            solution_id: evaluation.solution_id.clone(),
            strengths: strengths_for(&evaluation),
            weaknesses: weaknesses_for(&evaluation),
            rank: rank + 1,
            evaluation,
        })
        .collect();

    let winner = solutions.first().and_then(|top| {
        let unique = match solutions.get(1) {
            Some(second) => (top.evaluation.overall_score - second.evaluation.overall_score).abs() > TIE_EPSILON,
            None => true,
        };
        unique.then(|| top.solution_id.clone())
    });

    let confidence = solutions.first().map(|s| s.evaluation.confidence).unwrap_or(0.0);

    SolutionRanking { solutions, winner, confidence }
}

#[derive(Debug, Clone, Copy)]
pub struct AutoAcceptConfig {
    pub min_score: f64,
    pub min_confidence: f64,
    pub min_margin: f64,
}

impl Default for AutoAcceptConfig {
    fn default() -> Self {
        Self { min_score: 0.85, min_confidence: 0.8, min_margin: 0.05 }
    }
}

#[derive(Debug, Clone)]
pub struct AutoAcceptDecision {
    pub accept: bool,
    pub reason: String,
}

/// Evaluate the auto-accept gate, naming the first failing clause in the
/// order: no unique winner, below threshold, confidence too low, safety
/// failure, winner margin too small.
#[must_use]
pub fn should_auto_accept(ranking: &SolutionRanking, config: &AutoAcceptConfig) -> AutoAcceptDecision {
    let Some(winner_id) = &ranking.winner else {
        return AutoAcceptDecision { accept: false, reason: "no unique winner".to_string() };
    };
    let winner = ranking
        .solutions
        .iter()
        .find(|s| &s.solution_id == winner_id)
        .expect("winner id always refers to a ranked solution");

    if winner.evaluation.overall_score < config.min_score {
        return AutoAcceptDecision { accept: false, reason: "below threshold".to_string() };
    }
    if ranking.confidence < config.min_confidence {
        return AutoAcceptDecision { accept: false, reason: "confidence too low".to_string() };
    }
    if !winner.evaluation.safety.check_is_true("no_dangerous_ops")
        || !winner.evaluation.safety.check_is_true("no_secrets_exposed")
    {
        return AutoAcceptDecision { accept: false, reason: "safety failure".to_string() };
    }
    if let Some(runner_up) = ranking.solutions.get(1) {
        let margin = winner.evaluation.overall_score - runner_up.evaluation.overall_score;
        if margin < config.min_margin {
            return AutoAcceptDecision { accept: false, reason: "winner margin too small".to_string() };
        }
    }

    AutoAcceptDecision { accept: true, reason: "winner clears all gates".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryScore, CheckResult, CheckSource, SolutionId};

    fn eval(id: &str, overall_score: f64, safe: bool) -> SolutionEvaluation {
        let safety_checks = vec![
            if safe {
                CheckResult::pass("no_dangerous_ops", CheckSource::Automated)
            } else {
                CheckResult::fail("no_dangerous_ops", CheckSource::Automated, "unsafe")
            },
            CheckResult::pass("no_secrets_exposed", CheckSource::Automated),
        ];
        SolutionEvaluation {
            solution_id: SolutionId::from(id),
            correctness: CategoryScore { overall: 0.9, checks: vec![CheckResult::pass("tests", CheckSource::Automated)] },
            quality: CategoryScore::default(),
            efficiency: CategoryScore::default(),
            completeness: CategoryScore::default(),
            safety: CategoryScore { overall: bool_as_score(safe), checks: safety_checks },
            overall_score,
            confidence: 0.9,
            evaluated_at: chrono::Utc::now(),
        }
    }

    fn bool_as_score(v: bool) -> f64 {
        if v { 1.0 } else { 0.0 }
    }

    #[test]
    fn ranks_by_overall_score_descending() {
        let ranking = rank_solutions(vec![eval("a", 0.5, true), eval("b", 0.9, true)]);
        assert_eq!(ranking.solutions[0].solution_id, SolutionId::from("b"));
        assert_eq!(ranking.solutions[0].rank, 1);
    }

    #[test]
    fn ties_within_epsilon_have_no_unique_winner() {
        let ranking = rank_solutions(vec![eval("a", 0.80, true), eval("b", 0.805, true)]);
        assert!(ranking.winner.is_none());
    }

    #[test]
    fn s5_auto_accept_requires_margin() {
        let ranking = rank_solutions(vec![eval("a", 0.80, true), eval("b", 0.90, true)]);
        let decision = should_auto_accept(&ranking, &AutoAcceptConfig::default());
        assert!(decision.accept);
    }

    #[test]
    fn auto_accept_rejects_unsafe_winner() {
        let ranking = rank_solutions(vec![eval("a", 0.5, true), eval("b", 0.95, false)]);
        let decision = should_auto_accept(&ranking, &AutoAcceptConfig::default());
        assert!(!decision.accept);
        assert_eq!(decision.reason, "safety failure");
    }

    #[test]
    fn auto_accept_rejects_small_margin() {
        let ranking = rank_solutions(vec![eval("a", 0.86, true), eval("b", 0.90, true)]);
        let decision = should_auto_accept(&ranking, &AutoAcceptConfig::default());
        assert!(!decision.accept);
        assert_eq!(decision.reason, "winner margin too small");
    }

    #[test]
    fn auto_accept_rejects_below_threshold() {
        let ranking = rank_solutions(vec![eval("a", 0.5, true)]);
        let decision = should_auto_accept(&ranking, &AutoAcceptConfig::default());
        assert_eq!(decision.reason, "below threshold");
    }
}
