//! Iteration runner: spawns, polls, and aggregates an [`IterationPlan`]'s
//! variations through an injected [`WorkerGateway`]. The runner itself does
//! no I/O — everything it touches beyond plain data is the gateway trait,
//! kept separate precisely so this module stays testable without mocks
//! beyond a fake gateway.

mod aggregate;
mod collector;
mod confidence;
mod limits;
mod prompt;
mod result_scoring;

pub use aggregate::{aggregate, AggregateOutcome, AggregationStrategy};
pub use collector::{ResultCollector, ResultListener};
pub use confidence::parse_confidence;
pub use limits::{deny_reason, LimitEnforcer};
pub use prompt::build_prompt;
pub use result_scoring::{score_result, Penalties, ScoringWeights};

use crate::types::{
    IterationPlan, IterationResult, IterationVariation, OutputType, PlanStatus, ResultMetrics, RunId,
    VariationStatus,
};
use async_trait::async_trait;
use std::time::Duration;

/// Outcome of a spawn attempt against the Worker Gateway.
#[derive(Debug, Clone)]
pub enum SpawnOutcome {
    Accepted { run_id: RunId },
    Rejected { error: String },
}

/// Outcome of a status poll.
#[derive(Debug, Clone)]
pub enum GatewayStatus {
    Running,
    Completed { output: String },
    Failed { error: String },
}

/// External interface to whatever actually runs sub-agent work. Real
/// implementations live outside this crate; this crate only depends on the
/// trait.
#[async_trait]
pub trait WorkerGateway: Send + Sync {
    async fn spawn(
        &self,
        task_prompt: &str,
        label: &str,
        model: Option<&str>,
        thinking: Option<&str>,
        timeout_s: u64,
    ) -> SpawnOutcome;

    async fn status(&self, run_id: &RunId) -> GatewayStatus;
}

fn synthesize_success(
    variation: &IterationVariation,
    run_id: RunId,
    started_at: chrono::DateTime<chrono::Utc>,
    output: String,
    weights: &ScoringWeights,
    penalties: &Penalties,
) -> IterationResult {
    let ended_at = chrono::Utc::now();
    let duration_ms = (ended_at - started_at).num_milliseconds().max(0);
    let confidence = parse_confidence(&output);
    let mut result = IterationResult {
        variation_id: variation.id.clone(),
        run_id,
        session_key: crate::types::SessionKey::from(variation.id.as_str()),
        started_at,
        ended_at,
        duration_ms,
        output,
        output_type: OutputType::Text,
        metrics: ResultMetrics { confidence, ..ResultMetrics::default() },
        usage: crate::types::UsageMetrics::default(),
        success: true,
        error: None,
    };
    result.metrics.overall_score = score_result(&result, weights, penalties);
    result
}

fn synthesize_failure(
    variation: &IterationVariation,
    run_id: RunId,
    started_at: chrono::DateTime<chrono::Utc>,
    error: String,
    weights: &ScoringWeights,
    penalties: &Penalties,
) -> IterationResult {
    let ended_at = chrono::Utc::now();
    let duration_ms = (ended_at - started_at).num_milliseconds().max(0);
    let mut result = IterationResult {
        variation_id: variation.id.clone(),
        run_id,
        session_key: crate::types::SessionKey::from(variation.id.as_str()),
        started_at,
        ended_at,
        duration_ms,
        output: String::new(),
        output_type: OutputType::Text,
        metrics: ResultMetrics::default(),
        usage: crate::types::UsageMetrics::default(),
        success: false,
        error: Some(error),
    };
    result.metrics.overall_score = score_result(&result, weights, penalties);
    result
}

/// Tracks a variation's in-flight gateway state while the runner polls it.
struct Spawned {
    variation_index: usize,
    run_id: RunId,
    started_at: chrono::DateTime<chrono::Utc>,
}

pub struct RunnerConfig {
    pub poll_interval: Duration,
    pub weights: ScoringWeights,
    pub penalties: Penalties,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(1), weights: ScoringWeights::default(), penalties: Penalties::default() }
    }
}

/// Drives a single [`IterationPlan`] to completion against a [`WorkerGateway`].
///
/// Owns the plan for the duration of `execute()`; no two runners may mutate
/// the same plan concurrently (the type itself does not enforce this — it
/// is a caller discipline, as in the specification this module follows).
pub struct IterationRunner<G: WorkerGateway> {
    gateway: G,
    config: RunnerConfig,
}

impl<G: WorkerGateway> IterationRunner<G> {
    pub fn new(gateway: G, config: RunnerConfig) -> Self {
        Self { gateway, config }
    }

    /// Run `plan` to completion, mutating its status in place and returning
    /// the final aggregate.
    pub async fn execute(&self, plan: &mut IterationPlan) -> AggregateOutcome {
        plan.status = PlanStatus::Running;
        plan.started_at = Some(chrono::Utc::now());

        let variations_count = plan.variations.len();
        let mut collector = ResultCollector::new(plan.completion_criteria, variations_count);
        let mut enforcer = LimitEnforcer::new(plan.limits);
        let mut spawned: Vec<Spawned> = Vec::new();

        let mut pending: Vec<usize> = (0..variations_count).collect();
        pending.sort_by_key(|&i| plan.variations[i].priority);

        self.spawn_loop(plan, &mut pending, &mut spawned, &mut enforcer).await;

        loop {
            if collector.is_complete() {
                break;
            }
            if enforcer.remaining_time_ms() <= 0 {
                for s in &spawned {
                    let variation = &plan.variations[s.variation_index];
                    let result = synthesize_failure(
                        variation,
                        s.run_id.clone(),
                        s.started_at,
                        "Total timeout exceeded".to_string(),
                        &self.config.weights,
                        &self.config.penalties,
                    );
                    plan.variations[s.variation_index].status = VariationStatus::Timeout;
                    plan.variations[s.variation_index].result = Some(result.clone());
                    collector.insert(result);
                }
                spawned.clear();
                plan.status = PlanStatus::Timeout;
                break;
            }

            tokio::time::sleep(self.config.poll_interval).await;

            let mut still_active = Vec::new();
            let mut completed_this_round = false;
            for s in spawned {
                match self.gateway.status(&s.run_id).await {
                    GatewayStatus::Running => still_active.push(s),
                    GatewayStatus::Completed { output } => {
                        let variation = &plan.variations[s.variation_index];
                        let result = synthesize_success(
                            variation,
                            s.run_id.clone(),
                            s.started_at,
                            output,
                            &self.config.weights,
                            &self.config.penalties,
                        );
                        enforcer.record_completion(result.usage.estimated_cost, result.usage.total_tokens);
                        plan.variations[s.variation_index].status = VariationStatus::Completed;
                        plan.variations[s.variation_index].run_id = Some(s.run_id);
                        plan.variations[s.variation_index].result = Some(result.clone());
                        collector.insert(result);
                        completed_this_round = true;
                    }
                    GatewayStatus::Failed { error } => {
                        let variation = &plan.variations[s.variation_index];
                        let result = synthesize_failure(
                            variation,
                            s.run_id.clone(),
                            s.started_at,
                            error,
                            &self.config.weights,
                            &self.config.penalties,
                        );
                        enforcer.record_completion(result.usage.estimated_cost, result.usage.total_tokens);
                        plan.variations[s.variation_index].status = VariationStatus::Failed;
                        plan.variations[s.variation_index].run_id = Some(s.run_id);
                        plan.variations[s.variation_index].result = Some(result.clone());
                        collector.insert(result);
                        completed_this_round = true;
                    }
                }
            }
            spawned = still_active;

            if completed_this_round {
                self.spawn_loop(plan, &mut pending, &mut spawned, &mut enforcer).await;
            }

            if plan.variations.is_empty() {
                break;
            }
        }

        if !matches!(plan.status, PlanStatus::Timeout) {
            plan.status = PlanStatus::Completed;
        }
        plan.completed_at = Some(chrono::Utc::now());

        aggregate(collector.results(), AggregationStrategy::Best, |r| r.metrics.overall_score)
    }

    async fn spawn_loop(
        &self,
        plan: &mut IterationPlan,
        pending: &mut Vec<usize>,
        spawned: &mut Vec<Spawned>,
        enforcer: &mut LimitEnforcer,
    ) {
        while let Some(&index) = pending.first() {
            if enforcer.can_spawn().is_err() {
                break;
            }
            pending.remove(0);
            let variation = plan.variations[index].clone();
            let task_prompt = build_prompt(&plan.task, &variation);
            let timeout_s = plan.limits.per_iteration_timeout_s;
            match self
                .gateway
                .spawn(&task_prompt, &variation.label, variation.model.as_deref(), None, timeout_s)
                .await
            {
                SpawnOutcome::Accepted { run_id } => {
                    enforcer.record_spawn();
                    plan.variations[index].status = VariationStatus::Spawned;
                    plan.variations[index].run_id = Some(run_id.clone());
                    spawned.push(Spawned { variation_index: index, run_id, started_at: chrono::Utc::now() });
                }
                SpawnOutcome::Rejected { error: _ } => {
                    plan.variations[index].status = VariationStatus::Skipped;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CompletionCriteria, IterationLimits, IterationVariation, PlanId, TaskHandle, TaskId, VariationId,
    };
    use std::sync::Mutex;

    struct ScriptedGateway {
        next_run_id: Mutex<u64>,
        outcomes: Mutex<std::collections::HashMap<String, GatewayStatus>>,
    }

    impl ScriptedGateway {
        fn new(outcomes: Vec<(&str, GatewayStatus)>) -> Self {
            let map = outcomes.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
            Self { next_run_id: Mutex::new(0), outcomes: Mutex::new(map) }
        }
    }

    #[async_trait]
    impl WorkerGateway for ScriptedGateway {
        async fn spawn(
            &self,
            _task_prompt: &str,
            label: &str,
            _model: Option<&str>,
            _thinking: Option<&str>,
            _timeout_s: u64,
        ) -> SpawnOutcome {
            let mut counter = self.next_run_id.lock().unwrap();
            *counter += 1;
            let _ = label;
            SpawnOutcome::Accepted { run_id: RunId::from(format!("run-{counter}")) }
        }

        async fn status(&self, run_id: &RunId) -> GatewayStatus {
            let mut outcomes = self.outcomes.lock().unwrap();
            outcomes
                .remove(run_id.as_str())
                .unwrap_or(GatewayStatus::Completed { output: "Confidence: 90%".to_string() })
        }
    }

    fn plan_with(variations: Vec<IterationVariation>) -> IterationPlan {
        IterationPlan::new(
            PlanId::from("p1"),
            TaskHandle { id: TaskId::from("t1"), title: "demo".to_string(), description: None },
            crate::types::RunnerStrategy::Parallel,
            variations,
            IterationLimits {
                max_concurrent: 4,
                max_total: 10,
                per_iteration_timeout_s: 60,
                total_timeout_s: 60,
                total_cost_cap: None,
                total_token_cap: None,
            },
            CompletionCriteria { wait_for_all: true, ..CompletionCriteria::default() },
        )
    }

    #[tokio::test]
    async fn execute_spawns_and_completes_single_variation() {
        let gateway = ScriptedGateway::new(vec![("run-1", GatewayStatus::Completed { output: "Confidence: 80%".to_string() })]);
        let mut plan = plan_with(vec![IterationVariation::new(VariationId::from("v1"), "base", 0)]);
        let runner = IterationRunner::new(gateway, RunnerConfig { poll_interval: Duration::from_millis(1), ..RunnerConfig::default() });
        let outcome = runner.execute(&mut plan).await;
        assert_eq!(plan.status, PlanStatus::Completed);
        assert!(plan.completed_at.is_some());
        assert_eq!(outcome.selected.len(), 1);
    }

    #[tokio::test]
    async fn execute_aggregates_failures_as_no_winner() {
        let gateway = ScriptedGateway::new(vec![("run-1", GatewayStatus::Failed { error: "boom".to_string() })]);
        let mut plan = plan_with(vec![IterationVariation::new(VariationId::from("v1"), "base", 0)]);
        let runner = IterationRunner::new(gateway, RunnerConfig { poll_interval: Duration::from_millis(1), ..RunnerConfig::default() });
        let outcome = runner.execute(&mut plan).await;
        assert!(outcome.selected.is_empty());
        assert_eq!(outcome.reasoning, "No successful results to aggregate");
    }

    #[tokio::test]
    async fn completions_free_concurrency_slots_for_later_variations() {
        // max_concurrent is below the variation count, so every variation
        // past the first must wait for an earlier one's completion to free
        // its slot. If completions never decremented active_count this would
        // hang until the plan's total timeout.
        let gateway = ScriptedGateway::new(Vec::new());
        let mut plan = IterationPlan::new(
            PlanId::from("p1"),
            TaskHandle { id: TaskId::from("t1"), title: "demo".to_string(), description: None },
            crate::types::RunnerStrategy::Parallel,
            vec![
                IterationVariation::new(VariationId::from("v1"), "base", 0),
                IterationVariation::new(VariationId::from("v2"), "base", 0),
                IterationVariation::new(VariationId::from("v3"), "base", 0),
            ],
            IterationLimits {
                max_concurrent: 1,
                max_total: 10,
                per_iteration_timeout_s: 60,
                total_timeout_s: 5,
                total_cost_cap: None,
                total_token_cap: None,
            },
            CompletionCriteria { wait_for_all: true, ..CompletionCriteria::default() },
        );
        let runner = IterationRunner::new(gateway, RunnerConfig { poll_interval: Duration::from_millis(1), ..RunnerConfig::default() });
        let outcome = runner.execute(&mut plan).await;
        assert_eq!(plan.status, PlanStatus::Completed);
        assert_eq!(outcome.selected.len(), 1);
        assert!(plan.variations.iter().all(|v| v.status == VariationStatus::Completed));
    }
}
