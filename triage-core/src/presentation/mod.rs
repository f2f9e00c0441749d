//! Presentation view builder and the action-key protocol. Pure; the
//! channel renderer that actually draws these structs lives outside this
//! crate.

pub mod action;

pub use action::{parse_action, Action, ActionBarConfig, ActionContext};

use crate::types::{RankedSolution, SolutionId, SolutionRanking};

#[derive(Debug, Clone)]
pub struct SummaryView {
    pub task_id: String,
    pub task_title: String,
    pub winner: Option<SolutionId>,
    pub iterations: Vec<RankedSolution>,
    pub winner_strengths: Vec<String>,
    pub winner_tradeoffs: Vec<String>,
    pub auto_acceptance: bool,
    pub evaluation_duration_ms: i64,
    pub evaluated_at: chrono::DateTime<chrono::Utc>,
}

/// Build the top-level summary view from a completed ranking. Deterministic
/// for identical inputs.
#[must_use]
pub fn build_summary_view(
    ranking: &SolutionRanking,
    task_id: impl Into<String>,
    task_title: impl Into<String>,
    auto_acceptance: bool,
    evaluation_duration_ms: i64,
) -> SummaryView {
    let winner_solution = ranking.winner.as_ref().and_then(|id| ranking.solutions.iter().find(|s| &s.solution_id == id));

    // Falls back to the latest evaluation timestamp across all solutions (not
    // just the winner) so the view stays a pure function of `ranking` even
    // when there is no winner; only an empty ranking falls back further, to
    // the epoch.
    let evaluated_at = winner_solution.map(|s| s.evaluation.evaluated_at).unwrap_or_else(|| {
        ranking
            .solutions
            .iter()
            .map(|s| s.evaluation.evaluated_at)
            .max()
            .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)
    });

    SummaryView {
        task_id: task_id.into(),
        task_title: task_title.into(),
        winner: ranking.winner.clone(),
        iterations: ranking.solutions.clone(),
        winner_strengths: winner_solution.map(|s| s.strengths.clone()).unwrap_or_default(),
        winner_tradeoffs: winner_solution.map(|s| s.weaknesses.clone()).unwrap_or_default(),
        auto_acceptance,
        evaluation_duration_ms,
        evaluated_at,
    }
}

#[derive(Debug, Clone)]
pub struct ScoreBreakdownEntry {
    pub category: String,
    pub score: f64,
    pub weight: f64,
    pub checks: Vec<crate::types::CheckResult>,
}

#[derive(Debug, Clone)]
pub struct DetailView {
    pub solution_id: SolutionId,
    pub overall_score: f64,
    pub confidence: f64,
    pub score_breakdown: Vec<ScoreBreakdownEntry>,
}

/// Build the per-solution detail view from an evaluation and the category
/// weights that produced its `overall_score`.
#[must_use]
pub fn build_detail_view(
    evaluation: &crate::types::SolutionEvaluation,
    weights: &crate::evaluator::EvaluationWeights,
) -> DetailView {
    let score_breakdown = vec![
        ScoreBreakdownEntry {
            category: "correctness".to_string(),
            score: evaluation.correctness.overall,
            weight: weights.correctness,
            checks: evaluation.correctness.checks.clone(),
        },
        ScoreBreakdownEntry {
            category: "quality".to_string(),
            score: evaluation.quality.overall,
            weight: weights.quality,
            checks: evaluation.quality.checks.clone(),
        },
        ScoreBreakdownEntry {
            category: "efficiency".to_string(),
            score: evaluation.efficiency.overall,
            weight: weights.efficiency,
            checks: evaluation.efficiency.checks.clone(),
        },
        ScoreBreakdownEntry {
            category: "completeness".to_string(),
            score: evaluation.completeness.overall,
            weight: weights.completeness,
            checks: evaluation.completeness.checks.clone(),
        },
        ScoreBreakdownEntry {
            category: "safety".to_string(),
            score: evaluation.safety.overall,
            weight: weights.safety,
            checks: evaluation.safety.checks.clone(),
        },
    ];

    DetailView {
        solution_id: evaluation.solution_id.clone(),
        overall_score: evaluation.overall_score,
        confidence: evaluation.confidence,
        score_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryScore, SolutionEvaluation};

    fn ranking_with_winner() -> SolutionRanking {
        let evaluation = SolutionEvaluation {
            solution_id: SolutionId::from("s1"),
            correctness: CategoryScore::default(),
            quality: CategoryScore::default(),
            efficiency: CategoryScore::default(),
            completeness: CategoryScore::default(),
            safety: CategoryScore::default(),
            overall_score: 0.9,
            confidence: 0.9,
            evaluated_at: chrono::Utc::now(),
        };
        SolutionRanking {
            solutions: vec![RankedSolution {
                solution_id: SolutionId::from("s1"),
                evaluation,
                rank: 1,
                strengths: vec!["All tests pass".to_string()],
                weaknesses: vec![],
            }],
            winner: Some(SolutionId::from("s1")),
            confidence: 0.9,
        }
    }

    #[test]
    fn summary_view_carries_winner_strengths() {
        let view = build_summary_view(&ranking_with_winner(), "t1", "Fix the bug", true, 1500);
        assert_eq!(view.winner, Some(SolutionId::from("s1")));
        assert_eq!(view.winner_strengths, vec!["All tests pass".to_string()]);
        assert!(view.auto_acceptance);
    }

    #[test]
    fn summary_view_is_deterministic() {
        let ranking = ranking_with_winner();
        let a = build_summary_view(&ranking, "t1", "Fix the bug", true, 1500);
        let b = build_summary_view(&ranking, "t1", "Fix the bug", true, 1500);
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.winner_strengths, b.winner_strengths);
    }

    #[test]
    fn no_winner_yields_empty_strengths() {
        let mut ranking = ranking_with_winner();
        ranking.winner = None;
        let view = build_summary_view(&ranking, "t1", "Fix the bug", false, 0);
        assert!(view.winner_strengths.is_empty());
    }

    #[test]
    fn evaluated_at_is_deterministic_even_without_a_winner() {
        let mut ranking = ranking_with_winner();
        ranking.winner = None;
        let a = build_summary_view(&ranking, "t1", "Fix the bug", false, 0);
        let b = build_summary_view(&ranking, "t1", "Fix the bug", false, 0);
        assert_eq!(a.evaluated_at, b.evaluated_at);
        assert_eq!(a.evaluated_at, ranking.solutions[0].evaluation.evaluated_at);
    }

    #[test]
    fn evaluated_at_falls_back_to_epoch_for_an_empty_ranking() {
        let ranking = SolutionRanking { solutions: Vec::new(), winner: None, confidence: 0.0 };
        let view = build_summary_view(&ranking, "t1", "Fix the bug", false, 0);
        assert_eq!(view.evaluated_at, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
    }
}
