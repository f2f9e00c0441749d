//! Solution evaluator: turns a [`SolutionInput`] plus injected
//! [`ComparatorDeps`] into a [`SolutionEvaluation`] across five fixed
//! rubric categories.

pub mod analyzers;

use crate::scoring::{bool_to_score, clamp01, weighted_average};
use crate::types::{CategoryScore, CheckResult, CheckSource, SolutionEvaluation, SolutionId};
use crate::{Error, Result};

/// Outcome of running one configured command (test/type-check/lint/build).
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub success: bool,
    pub fraction: Option<f64>,
    pub message: Option<String>,
}

/// Outcome of one `llmAssess` call.
#[derive(Debug, Clone, Copy)]
pub struct LlmAssessment {
    pub score: f64,
    pub confidence: f64,
}

/// External collaborators injected into the evaluator so it stays pure and
/// testable without a live process or model. Failures here are absorbed per
/// the specification's per-check failure policy, not propagated.
pub trait ComparatorDeps {
    fn spawn_command(&self, name: &str) -> std::result::Result<CommandOutcome, String>;
    fn llm_assess(&self, prompt: &str, solution: &SolutionInput) -> std::result::Result<LlmAssessment, String>;
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}

#[derive(Debug, Clone)]
pub struct SolutionInput {
    pub solution_id: SolutionId,
    pub iteration_id: String,
    pub task_description: String,
    pub original_code: Option<String>,
    pub solution_code: String,
    pub changed_files: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluationWeights {
    pub correctness: f64,
    pub quality: f64,
    pub efficiency: f64,
    pub completeness: f64,
    pub safety: f64,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        Self { correctness: 0.4, quality: 0.25, efficiency: 0.15, completeness: 0.1, safety: 0.1 }
    }
}

impl EvaluationWeights {
    fn sum(&self) -> f64 {
        self.correctness + self.quality + self.efficiency + self.completeness + self.safety
    }

    fn validate(&self) -> Result<()> {
        if (self.sum() - 1.0).abs() > 1e-6 {
            return Err(Error::Configuration(format!(
                "evaluation weights must sum to 1.0, got {}",
                self.sum()
            )));
        }
        Ok(())
    }
}

pub struct SolutionEvaluator<'a, D: ComparatorDeps> {
    deps: &'a D,
    weights: EvaluationWeights,
}

impl<'a, D: ComparatorDeps> SolutionEvaluator<'a, D> {
    pub fn new(deps: &'a D, weights: EvaluationWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { deps, weights })
    }

    fn try_command(&self, name: &str) -> (Option<f64>, f64, CheckResult) {
        match self.deps.spawn_command(name) {
            Ok(outcome) => {
                let check = if outcome.success {
                    CheckResult::pass(name, CheckSource::Automated)
                } else {
                    CheckResult::fail(name, CheckSource::Automated, outcome.message.clone().unwrap_or_default())
                };
                (outcome.fraction, bool_to_score(outcome.success), check)
            }
            Err(message) => (
                None,
                0.0,
                CheckResult::fail(name, CheckSource::Automated, message),
            ),
        }
    }

    fn try_llm(&self, check_name: &str, prompt: &str, solution: &SolutionInput) -> (f64, f64, CheckResult) {
        match self.deps.llm_assess(prompt, solution) {
            Ok(assessment) => (
                clamp01(assessment.score),
                assessment.confidence,
                CheckResult::score(check_name, clamp01(assessment.score), CheckSource::Llm),
            ),
            Err(_) => (0.5, 0.0, CheckResult::score(check_name, 0.5, CheckSource::Llm)),
        }
    }

    fn evaluate_correctness(&self, solution: &SolutionInput) -> (CategoryScore, f64) {
        let mut checks = Vec::new();
        let mut pairs = Vec::new();
        let mut confidences = Vec::new();

        for cmd in ["tests", "typecheck", "lint", "build"] {
            let (fraction, score, check) = self.try_command(cmd);
            checks.push(check);
            pairs.push((fraction.unwrap_or(score), 1.0));
        }

        let (coverage, coverage_conf, coverage_check) = self.try_llm(
            "requirement_coverage",
            "Assess requirement coverage",
            solution,
        );
        checks.push(coverage_check);
        pairs.push((coverage, 1.0));
        confidences.push(coverage_conf);

        let (edge_cases, edge_conf, edge_check) =
            self.try_llm("edge_case_handling", "Assess edge case handling", solution);
        checks.push(edge_check);
        pairs.push((edge_cases, 1.0));
        confidences.push(edge_conf);

        let overall = weighted_average(&pairs);
        let confidence = if confidences.is_empty() { 0.5 } else { confidences.iter().sum::<f64>() / confidences.len() as f64 };
        (CategoryScore { overall, checks }, confidence)
    }

    fn evaluate_quality(&self, solution: &SolutionInput) -> (CategoryScore, f64) {
        let complexity = analyzers::estimate_complexity(&solution.solution_code);
        let duplication = analyzers::estimate_duplication(&solution.solution_code);
        let comments = analyzers::comment_ratio(&solution.solution_code);

        let mut checks = vec![
            CheckResult::score("complexity", complexity.score, CheckSource::Automated),
            CheckResult::score("duplication", 1.0 - duplication, CheckSource::Automated),
            CheckResult::score("comment_ratio", comments, CheckSource::Automated),
        ];
        let mut pairs = vec![
            (complexity.score, 1.0),
            (1.0 - duplication, 1.0),
            (comments, 0.5),
        ];
        let mut confidences = Vec::new();

        for (name, prompt) in [
            ("naming", "Assess identifier naming quality"),
            ("pattern_adherence", "Assess adherence to idiomatic patterns"),
            ("error_handling", "Assess error handling quality"),
        ] {
            let (score, conf, check) = self.try_llm(name, prompt, solution);
            checks.push(check);
            pairs.push((score, 1.0));
            confidences.push(conf);
        }

        let overall = weighted_average(&pairs);
        let confidence = if confidences.is_empty() { 0.5 } else { confidences.iter().sum::<f64>() / confidences.len() as f64 };
        (CategoryScore { overall, checks }, confidence)
    }

    fn evaluate_efficiency(&self, solution: &SolutionInput) -> (CategoryScore, f64) {
        let cleanup_clean = !solution.solution_code.to_lowercase().contains("todo: cleanup");
        let cleanup_check = if cleanup_clean {
            CheckResult::pass("resource_cleanup", CheckSource::Automated)
        } else {
            CheckResult::fail("resource_cleanup", CheckSource::Automated, "unresolved cleanup TODO found")
        };

        let mut checks = vec![cleanup_check];
        let mut pairs = vec![(bool_to_score(cleanup_clean), 1.0)];
        let mut confidences = Vec::new();

        for (name, prompt) in [
            ("algorithmic", "Assess algorithmic efficiency"),
            ("async_efficiency", "Assess async/concurrency efficiency"),
        ] {
            let (score, conf, check) = self.try_llm(name, prompt, solution);
            checks.push(check);
            pairs.push((score, 1.0));
            confidences.push(conf);
        }

        let overall = weighted_average(&pairs);
        let confidence = confidences.iter().sum::<f64>() / confidences.len().max(1) as f64;
        (CategoryScore { overall, checks }, confidence)
    }

    fn evaluate_completeness(&self, solution: &SolutionInput) -> (CategoryScore, f64) {
        let documentation_added = solution.solution_code.contains("///") || solution.solution_code.contains("//!");
        let tests_added_ratio = solution
            .changed_files
            .iter()
            .filter(|f| f.contains("test"))
            .count() as f64
            / solution.changed_files.len().max(1) as f64;
        let changelog_updated = solution.changed_files.iter().any(|f| f.to_lowercase().contains("changelog"));

        let mut checks = vec![
            if documentation_added {
                CheckResult::pass("documentation_added", CheckSource::Automated)
            } else {
                CheckResult::fail("documentation_added", CheckSource::Automated, "no doc comments found")
            },
            CheckResult::score("tests_added", tests_added_ratio, CheckSource::Automated),
            if changelog_updated {
                CheckResult::pass("changelog_updated", CheckSource::Automated)
            } else {
                CheckResult::fail("changelog_updated", CheckSource::Automated, "no changelog entry found")
            },
        ];

        let (requirements_met, conf, check) =
            self.try_llm("requirements_met", "Assess whether stated requirements are met", solution);
        checks.push(check);

        let pairs = vec![
            (bool_to_score(documentation_added), 1.0),
            (tests_added_ratio, 1.0),
            (bool_to_score(changelog_updated), 0.5),
            (requirements_met, 1.0),
        ];
        let overall = weighted_average(&pairs);
        (CategoryScore { overall, checks }, conf)
    }

    fn evaluate_safety(&self, solution: &SolutionInput) -> (CategoryScore, f64) {
        let dangerous = analyzers::check_dangerous_ops(&solution.solution_code);
        let secrets = analyzers::check_secrets_exposed(&solution.solution_code);

        let mut checks = vec![
            if dangerous.safe {
                CheckResult::pass("no_dangerous_ops", CheckSource::Automated)
            } else {
                CheckResult::fail("no_dangerous_ops", CheckSource::Automated, dangerous.issues.join("; "))
            },
            if secrets.safe {
                CheckResult::pass("no_secrets_exposed", CheckSource::Automated)
            } else {
                CheckResult::fail("no_secrets_exposed", CheckSource::Automated, secrets.issues.join("; "))
            },
        ];

        let (security_review, review_conf, review_check) =
            self.try_llm("security_review", "Assess security posture of this change", solution);
        checks.push(review_check);
        let (rollback_safe, rollback_conf, rollback_check) =
            self.try_llm("rollback_safe", "Assess whether this change is safely revertible", solution);
        checks.push(rollback_check);

        let pairs = vec![
            (bool_to_score(dangerous.safe), 1.0),
            (bool_to_score(secrets.safe), 1.0),
            (security_review, 1.0),
            (rollback_safe, 1.0),
        ];
        let overall = weighted_average(&pairs);
        let confidence = (review_conf + rollback_conf) / 2.0;
        (CategoryScore { overall, checks }, confidence)
    }

    #[must_use]
    pub fn evaluate(&self, solution: &SolutionInput) -> SolutionEvaluation {
        let (correctness, c1) = self.evaluate_correctness(solution);
        let (quality, c2) = self.evaluate_quality(solution);
        let (efficiency, c3) = self.evaluate_efficiency(solution);
        let (completeness, c4) = self.evaluate_completeness(solution);
        let (safety, c5) = self.evaluate_safety(solution);

        let overall_score = correctness.overall * self.weights.correctness
            + quality.overall * self.weights.quality
            + efficiency.overall * self.weights.efficiency
            + completeness.overall * self.weights.completeness
            + safety.overall * self.weights.safety;

        let confidences = [c1, c2, c3, c4, c5];
        let confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;

        SolutionEvaluation {
            solution_id: solution.solution_id.clone(),
            correctness,
            quality,
            efficiency,
            completeness,
            safety,
            overall_score: clamp01(overall_score),
            confidence: clamp01(confidence),
            evaluated_at: self.deps.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubDeps {
        command_success: bool,
    }

    impl ComparatorDeps for StubDeps {
        fn spawn_command(&self, _name: &str) -> std::result::Result<CommandOutcome, String> {
            Ok(CommandOutcome { success: self.command_success, fraction: None, message: None })
        }

        fn llm_assess(&self, _prompt: &str, _solution: &SolutionInput) -> std::result::Result<LlmAssessment, String> {
            Ok(LlmAssessment { score: 0.9, confidence: 0.9 })
        }

        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            chrono::Utc::now()
        }
    }

    fn solution() -> SolutionInput {
        SolutionInput {
            solution_id: SolutionId::from("s1"),
            iteration_id: "i1".to_string(),
            task_description: "fix bug".to_string(),
            original_code: None,
            solution_code: "/// doc\nfn add(a: i32, b: i32) -> i32 { a + b }".to_string(),
            changed_files: vec!["src/lib.rs".to_string(), "tests/add_test.rs".to_string()],
        }
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let deps = StubDeps { command_success: true };
        let weights = EvaluationWeights { correctness: 0.5, ..EvaluationWeights::default() };
        assert!(SolutionEvaluator::new(&deps, weights).is_err());
    }

    #[test]
    fn evaluate_produces_score_in_unit_interval() {
        let deps = StubDeps { command_success: true };
        let evaluator = SolutionEvaluator::new(&deps, EvaluationWeights::default()).unwrap();
        let evaluation = evaluator.evaluate(&solution());
        assert!(evaluation.overall_score >= 0.0 && evaluation.overall_score <= 1.0);
        assert!(evaluation.confidence > 0.0);
    }

    #[test]
    fn failing_commands_lower_correctness_without_aborting() {
        let deps = StubDeps { command_success: false };
        let evaluator = SolutionEvaluator::new(&deps, EvaluationWeights::default()).unwrap();
        let evaluation = evaluator.evaluate(&solution());
        assert!(evaluation.correctness.overall < 1.0);
    }

    struct ThrowingDeps;
    impl ComparatorDeps for ThrowingDeps {
        fn spawn_command(&self, _name: &str) -> std::result::Result<CommandOutcome, String> {
            Err("process failed to start".to_string())
        }
        fn llm_assess(&self, _prompt: &str, _solution: &SolutionInput) -> std::result::Result<LlmAssessment, String> {
            Err("model unavailable".to_string())
        }
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            chrono::Utc::now()
        }
    }

    #[test]
    fn per_check_failures_default_to_neutral_without_aborting() {
        let deps = ThrowingDeps;
        let evaluator = SolutionEvaluator::new(&deps, EvaluationWeights::default()).unwrap();
        let evaluation = evaluator.evaluate(&solution());
        assert!(evaluation.overall_score >= 0.0);
        assert_eq!(evaluation.correctness.check("requirement_coverage").unwrap().value, Some(0.5));
    }
}
