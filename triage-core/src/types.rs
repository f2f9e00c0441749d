//! Shared data model.
//!
//! Every type here is a plain, serde-serializable struct or enum; none of
//! them own I/O. Opaque identifiers are thin newtypes rather than raw
//! `String` so the compiler catches id-kind mix-ups (a `TaskId` passed where
//! a `VariationId` is expected will not compile).

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;

macro_rules! newtype_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

newtype_id!(TaskId);
newtype_id!(VariationId);
newtype_id!(RunId);
newtype_id!(PlanId);
newtype_id!(SolutionId);
newtype_id!(PatternId);
newtype_id!(ExperimentId);
newtype_id!(VariantId);
newtype_id!(SessionKey);
newtype_id!(AgentId);

/// Current disposition of a task in the external tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Review,
    Closed,
    WontDo,
}

impl TaskStatus {
    /// A task in one of these statuses is satisfied/terminal: it never
    /// blocks a dependent and is never itself pickable.
    #[must_use]
    pub fn is_resolved(self) -> bool {
        matches!(self, TaskStatus::Closed | TaskStatus::WontDo)
    }
}

/// Task priority, ordered low to high in declaration order for convenience;
/// scoring always goes through [`crate::picker::PRIORITY_MAP`] rather than
/// relying on enum discriminant order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// A task pulled in from an external source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickableTask {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub labels: Vec<String>,
    pub assignees: HashSet<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub comment_count: u32,
    pub depends_on: Option<HashSet<TaskId>>,
    pub estimated_complexity: Option<u8>,
}

impl PickableTask {
    /// `depends_on` resolved against `never-existed ids treated as satisfied`
    /// is handled by the picker, not here; this just exposes the raw set.
    #[must_use]
    pub fn dependency_ids(&self) -> Vec<&TaskId> {
        self.depends_on
            .as_ref()
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }
}

/// Thinking-effort level requested of a sub-agent variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingLevel {
    None,
    Low,
    Medium,
    High,
}

/// Lifecycle state of a single variation. Transitions are monotonic through
/// the ordered set below plus exactly one terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationStatus {
    Pending,
    Spawned,
    Running,
    Completed,
    Failed,
    Timeout,
    Skipped,
}

impl VariationStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            VariationStatus::Completed
                | VariationStatus::Failed
                | VariationStatus::Timeout
                | VariationStatus::Skipped
        )
    }
}

/// One concrete parameterization of a task to be solved by a sub-agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationVariation {
    pub id: VariationId,
    pub label: String,
    pub priority: i32,
    pub model: Option<String>,
    pub thinking_level: Option<ThinkingLevel>,
    pub prompt_variant_id: Option<String>,
    pub additional_context: Option<String>,
    pub constraints: Vec<String>,
    pub temperature: Option<f32>,
    pub status: VariationStatus,
    pub run_id: Option<RunId>,
    pub result: Option<IterationResult>,
}

impl IterationVariation {
    #[must_use]
    pub fn new(id: VariationId, label: impl Into<String>, priority: i32) -> Self {
        Self {
            id,
            label: label.into(),
            priority,
            model: None,
            thinking_level: None,
            prompt_variant_id: None,
            additional_context: None,
            constraints: Vec::new(),
            temperature: None,
            status: VariationStatus::Pending,
            run_id: None,
            result: None,
        }
    }
}

/// How a runner spawns variations. Only governs *spawning order*; the final
/// aggregation fold is always `best` unless a caller overrides it
/// explicitly (see `runner::aggregate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerStrategy {
    Parallel,
    Sequential,
    Tournament,
    Adaptive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

impl PlanStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PlanStatus::Completed | PlanStatus::Failed | PlanStatus::Timeout | PlanStatus::Cancelled
        )
    }
}

/// Resource envelope a runner must respect while executing a plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IterationLimits {
    pub max_concurrent: usize,
    pub max_total: usize,
    pub per_iteration_timeout_s: u64,
    pub total_timeout_s: u64,
    pub total_cost_cap: Option<f64>,
    pub total_token_cap: Option<u64>,
}

impl Default for IterationLimits {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            max_total: 5,
            per_iteration_timeout_s: 300,
            total_timeout_s: 1800,
            total_cost_cap: None,
            total_token_cap: None,
        }
    }
}

/// Predicate over a plan's accumulated results deciding when a runner may
/// stop early.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CompletionCriteria {
    pub min_acceptable_score: Option<f64>,
    pub min_successful_variations: Option<usize>,
    pub wait_for_all: bool,
    pub stop_on_first_success: bool,
}

/// Handle identifying the task a plan is solving, carried by value so the
/// runner never has to reach back into the picker's task pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationPlan {
    pub id: PlanId,
    pub task: TaskHandle,
    pub strategy: RunnerStrategy,
    pub variations: Vec<IterationVariation>,
    pub limits: IterationLimits,
    pub completion_criteria: CompletionCriteria,
    pub status: PlanStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl IterationPlan {
    #[must_use]
    pub fn new(
        id: PlanId,
        task: TaskHandle,
        strategy: RunnerStrategy,
        variations: Vec<IterationVariation>,
        limits: IterationLimits,
        completion_criteria: CompletionCriteria,
    ) -> Self {
        Self {
            id,
            task,
            strategy,
            variations,
            limits,
            completion_criteria,
            status: PlanStatus::Pending,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Code,
    Text,
    Structured,
    Mixed,
}

/// Metrics a sub-agent can self-report or that scoring derives.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResultMetrics {
    pub confidence: Option<f64>,
    pub completeness: Option<f64>,
    pub code_quality: Option<f64>,
    pub responsiveness: Option<f64>,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationResult {
    pub variation_id: VariationId,
    pub run_id: RunId,
    pub session_key: SessionKey,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ended_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: i64,
    pub output: String,
    pub output_type: OutputType,
    pub metrics: ResultMetrics,
    pub usage: UsageMetrics,
    pub success: bool,
    pub error: Option<String>,
}

/// Source of a single [`CheckResult`] — a deterministic analyzer or an
/// injected `llmAssess` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSource {
    Automated,
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Pass,
    Fail,
    Score,
    Info,
}

/// One rubric sub-check, surfaced both to the ranker (for strengths /
/// weaknesses thresholding) and to the presentation layer's detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub kind: CheckKind,
    pub value: Option<f64>,
    pub message: Option<String>,
    pub source: CheckSource,
}

impl CheckResult {
    #[must_use]
    pub fn pass(name: impl Into<String>, source: CheckSource) -> Self {
        Self { name: name.into(), kind: CheckKind::Pass, value: None, message: None, source }
    }

    #[must_use]
    pub fn fail(name: impl Into<String>, source: CheckSource, message: impl Into<String>) -> Self {
        Self { name: name.into(), kind: CheckKind::Fail, value: None, message: Some(message.into()), source }
    }

    #[must_use]
    pub fn score(name: impl Into<String>, value: f64, source: CheckSource) -> Self {
        Self { name: name.into(), kind: CheckKind::Score, value: Some(value), message: None, source }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            CheckKind::Pass => Some(true),
            CheckKind::Fail => Some(false),
            CheckKind::Score | CheckKind::Info => None,
        }
    }
}

/// One of the five rubric categories of a [`SolutionEvaluation`]. `checks`
/// carries the named sub-checks that fed `overall`, in evaluation order —
/// the ranker's strengths/weaknesses vocabulary and the presentation
/// layer's `scoreBreakdown` both read from it by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryScore {
    pub overall: f64,
    pub checks: Vec<CheckResult>,
}

impl CategoryScore {
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn check_is_true(&self, name: &str) -> bool {
        self.check(name).and_then(CheckResult::as_bool).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionEvaluation {
    pub solution_id: SolutionId,
    pub correctness: CategoryScore,
    pub quality: CategoryScore,
    pub efficiency: CategoryScore,
    pub completeness: CategoryScore,
    pub safety: CategoryScore,
    pub overall_score: f64,
    pub confidence: f64,
    pub evaluated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSolution {
    pub solution_id: SolutionId,
    pub evaluation: SolutionEvaluation,
    pub rank: usize,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionRanking {
    pub solutions: Vec<RankedSolution>,
    pub winner: Option<SolutionId>,
    pub confidence: f64,
}

/// One recorded behavioral observation, tagged by kind via a payload union.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternObservation {
    pub agent_id: AgentId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub payload: ObservationPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObservationPayload {
    Time { action: String },
    Event { event: String, follow_up: String, delay_s: f64 },
    Context { keywords: Vec<String>, need: String, similarity_score: Option<f64> },
}

impl ObservationPayload {
    #[must_use]
    pub fn kind(&self) -> PatternType {
        match self {
            ObservationPayload::Time { .. } => PatternType::TimeBased,
            ObservationPayload::Event { .. } => PatternType::EventBased,
            ObservationPayload::Context { .. } => PatternType::ContextBased,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    TimeBased,
    EventBased,
    ContextBased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternDescriptor {
    Time { typical_action: String, time_of_day_minutes: u32, tolerance_minutes: u32, day_of_week: Option<String> },
    Event { typical_event: String, typical_follow_up: String, typical_delay_s: f64, expiration_s: f64 },
    Context { need: String, keywords: Vec<String>, use_semantic_matching: bool, relevance_threshold: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub agent_id: AgentId,
    pub pattern_type: PatternType,
    pub description: String,
    pub confidence: f64,
    pub observation_count: u32,
    pub first_observed: chrono::DateTime<chrono::Utc>,
    pub last_observed: chrono::DateTime<chrono::Utc>,
    pub active: bool,
    pub linked_reminder_id: Option<String>,
    pub descriptor: PatternDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentVariant {
    pub id: VariantId,
    pub name: String,
    pub description: String,
    pub instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub dimension: String,
    pub name: String,
    pub variants: Vec<ExperimentVariant>,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub traffic_allocation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantMetric {
    pub experiment_id: ExperimentId,
    pub variant_id: VariantId,
    pub exposures: u64,
    pub positive_count: u64,
    pub negative_count: u64,
}

impl Default for VariantMetric {
    fn default() -> Self {
        Self {
            experiment_id: ExperimentId::from(""),
            variant_id: VariantId::from(""),
            exposures: 0,
            positive_count: 0,
            negative_count: 0,
        }
    }
}

impl VariantMetric {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let total = self.positive_count + self.negative_count;
        if total == 0 {
            0.0
        } else {
            self.positive_count as f64 / total as f64
        }
    }

    #[must_use]
    pub fn confidence(&self, min_samples_for_significance: u64) -> f64 {
        let total = self.positive_count + self.negative_count;
        (total as f64 / min_samples_for_significance as f64).min(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub experiment_id: ExperimentId,
    pub variant_id: VariantId,
    pub session_key: SessionKey,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
}

/// Bounded ring buffer used by the pattern detector to scan "the last 100
/// observations of the same type" without unbounded growth.
#[derive(Debug, Clone)]
pub struct RecentObservations {
    capacity: usize,
    items: VecDeque<PatternObservation>,
}

impl RecentObservations {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, items: VecDeque::with_capacity(capacity) }
    }

    pub fn push(&mut self, observation: PatternObservation) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(observation);
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &PatternObservation> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
