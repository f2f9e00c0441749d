//! In-process `WorkerGateway`: "spawns" a variation by scheduling a
//! completion after a fixed or injectable delay, rather than shelling out to
//! a real sub-agent process. Lets the rest of the driver run the full
//! pipeline — spawn, poll, aggregate, evaluate, rank — against a gateway
//! that behaves like a real one without needing one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use triage_core::runner::{GatewayStatus, SpawnOutcome, WorkerGateway};
use triage_core::types::RunId;

/// What a spawned run resolves to once its delay elapses.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Completed { output: String },
    Failed { error: String },
}

struct Pending {
    ready_at: Instant,
    outcome: ScriptedOutcome,
}

/// Reference `WorkerGateway` used when there is no real sub-agent process to
/// drive. Every spawn is accepted immediately; `status` reports `Running`
/// until the configured delay has elapsed, then resolves to the outcome the
/// caller scripted (or a deterministic default keyed off the variation
/// label, if none was scripted).
pub struct MockGateway {
    delay: Duration,
    scripted: HashMap<String, ScriptedOutcome>,
    pending: Mutex<HashMap<String, Pending>>,
    next_id: AtomicU64,
}

impl MockGateway {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, scripted: HashMap::new(), pending: Mutex::new(HashMap::new()), next_id: AtomicU64::new(0) }
    }

    /// Script the outcome for a spawn whose `label` matches `label`, instead
    /// of the deterministic default.
    #[must_use]
    pub fn with_outcome(mut self, label: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        self.scripted.insert(label.into(), outcome);
        self
    }

    fn default_outcome(label: &str) -> ScriptedOutcome {
        // Deterministic confidence derived from the label so repeated runs
        // against the same variation set are reproducible without a script.
        let sum: u32 = label.bytes().map(u32::from).sum();
        let confidence = 55 + (sum % 40);
        ScriptedOutcome::Completed { output: format!("Confidence: {confidence}%\n\n(mock output for {label})") }
    }
}

#[async_trait]
impl WorkerGateway for MockGateway {
    async fn spawn(
        &self,
        _task_prompt: &str,
        label: &str,
        _model: Option<&str>,
        _thinking: Option<&str>,
        _timeout_s: u64,
    ) -> SpawnOutcome {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let run_id = RunId::from(format!("mock-run-{id}"));
        let outcome = self.scripted.get(label).cloned().unwrap_or_else(|| Self::default_outcome(label));
        let mut pending = self.pending.lock().await;
        pending.insert(run_id.as_str().to_string(), Pending { ready_at: Instant::now() + self.delay, outcome });
        SpawnOutcome::Accepted { run_id }
    }

    async fn status(&self, run_id: &RunId) -> GatewayStatus {
        let pending = self.pending.lock().await;
        let Some(entry) = pending.get(run_id.as_str()) else {
            return GatewayStatus::Failed { error: format!("unknown run id {run_id}") };
        };
        if Instant::now() < entry.ready_at {
            return GatewayStatus::Running;
        }
        match &entry.outcome {
            ScriptedOutcome::Completed { output } => GatewayStatus::Completed { output: output.clone() },
            ScriptedOutcome::Failed { error } => GatewayStatus::Failed { error: error.clone() },
        }
    }
}
