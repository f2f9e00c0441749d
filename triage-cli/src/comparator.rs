//! [`ComparatorDeps`] implementation backing the `run` command: real
//! commands via `std::process::Command`, a stubbed `llm_assess` since this
//! driver has no model integration of its own, and wall-clock `now`.

use std::process::Command;

use triage_core::evaluator::{CommandOutcome, ComparatorDeps, LlmAssessment, SolutionInput};

/// One configured check (`tests`, `typecheck`, `lint`, `build`) mapped to
/// the shell command that runs it, so a project without a `cargo test`
/// target can still be evaluated against whatever it does have.
#[derive(Debug, Clone, Default)]
pub struct CommandMap {
    pub tests: Option<String>,
    pub typecheck: Option<String>,
    pub lint: Option<String>,
    pub build: Option<String>,
}

impl From<crate::config::CommandsConfig> for CommandMap {
    fn from(value: crate::config::CommandsConfig) -> Self {
        Self { tests: value.tests, typecheck: value.typecheck, lint: value.lint, build: value.build }
    }
}

impl CommandMap {
    fn command_for(&self, name: &str) -> Option<&str> {
        match name {
            "tests" => self.tests.as_deref(),
            "typecheck" => self.typecheck.as_deref(),
            "lint" => self.lint.as_deref(),
            "build" => self.build.as_deref(),
            _ => None,
        }
    }
}

/// Evaluator dependencies wired for a real (non-mock) run: commands are
/// actually spawned; LLM-graded checks default to a neutral, low-confidence
/// score since no model is wired in, leaving the automated checks to carry
/// the evaluation.
pub struct CliComparatorDeps {
    pub commands: CommandMap,
    pub working_dir: std::path::PathBuf,
}

impl ComparatorDeps for CliComparatorDeps {
    fn spawn_command(&self, name: &str) -> Result<CommandOutcome, String> {
        let Some(cmd) = self.commands.command_for(name) else {
            return Ok(CommandOutcome { success: true, fraction: None, message: Some(format!("no `{name}` command configured, skipped")) });
        };
        let mut parts = cmd.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(format!("empty command configured for {name}"));
        };
        let output = Command::new(program)
            .args(parts)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|err| format!("failed to spawn `{cmd}`: {err}"))?;
        Ok(CommandOutcome {
            success: output.status.success(),
            fraction: None,
            message: (!output.status.success()).then(|| String::from_utf8_lossy(&output.stderr).into_owned()),
        })
    }

    fn llm_assess(&self, _prompt: &str, _solution: &SolutionInput) -> Result<LlmAssessment, String> {
        Ok(LlmAssessment { score: 0.5, confidence: 0.0 })
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_check_is_skipped_successfully() {
        let deps = CliComparatorDeps { commands: CommandMap::default(), working_dir: ".".into() };
        let outcome = deps.spawn_command("tests").unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn configured_command_runs_and_reports_status() {
        let deps = CliComparatorDeps {
            commands: CommandMap { tests: Some("true".to_string()), ..CommandMap::default() },
            working_dir: ".".into(),
        };
        let outcome = deps.spawn_command("tests").unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn failing_command_is_reported_not_errored() {
        let deps = CliComparatorDeps {
            commands: CommandMap { lint: Some("false".to_string()), ..CommandMap::default() },
            working_dir: ".".into(),
        };
        let outcome = deps.spawn_command("lint").unwrap();
        assert!(!outcome.success);
    }

    #[test]
    fn llm_assess_is_neutral_and_zero_confidence() {
        let deps = CliComparatorDeps { commands: CommandMap::default(), working_dir: ".".into() };
        let solution = SolutionInput {
            solution_id: triage_core::types::SolutionId::from("s1"),
            iteration_id: "i1".to_string(),
            task_description: String::new(),
            original_code: None,
            solution_code: String::new(),
            changed_files: Vec::new(),
        };
        let assessment = deps.llm_assess("prompt", &solution).unwrap();
        assert_eq!(assessment.score, 0.5);
        assert_eq!(assessment.confidence, 0.0);
    }
}
