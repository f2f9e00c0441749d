//! Wires a validated [`Config`] into the concrete collaborators the
//! commands need: a `TaskSourceAdapter`, the mock `WorkerGateway`, and the
//! two `triage-store` persistence handles. One `App` is built per
//! invocation in `main`.

use std::sync::Arc;
use std::time::Duration;

use triage_core::types::AgentId;
use triage_store::experiments::AbExperimentStore;
use triage_store::PatternStore;

use crate::adapters::{InMemoryAdapter, MarkdownAdapter, TaskSourceAdapter};
use crate::config::{AdapterConfig, Config};
use crate::gateway::MockGateway;

pub struct App {
    pub config: Config,
    pub adapter: Arc<dyn TaskSourceAdapter>,
    pub agent_id: AgentId,
}

impl App {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let adapter: Arc<dyn TaskSourceAdapter> = match &config.adapter {
            AdapterConfig::Memory => Arc::new(InMemoryAdapter::new(Vec::new())),
            AdapterConfig::Markdown { dir } => Arc::new(MarkdownAdapter::new(dir.clone())),
        };
        let agent_id = AgentId::from(config.agent_id.as_str());
        Self { config, adapter, agent_id }
    }

    /// A fresh mock gateway, scaled to the configured poll interval. A new
    /// instance per run since [`MockGateway`] is consumed by the
    /// [`triage_core::runner::IterationRunner`] it drives.
    #[must_use]
    pub fn new_gateway(&self) -> MockGateway {
        MockGateway::new(Duration::from_millis(self.config.poll_interval_ms))
    }

    /// Open this invocation's pattern store. A fresh handle per call, per
    /// `triage-store`'s "cheap to construct; do not share across agents"
    /// contract.
    pub async fn open_pattern_store(&self) -> anyhow::Result<PatternStore> {
        std::fs::create_dir_all(&self.config.state_dir)?;
        let db_path = self.config.state_dir.join("patterns.db");
        let store = PatternStore::open_local(db_path.to_string_lossy().to_string(), self.agent_id.clone()).await?;
        Ok(store)
    }

    #[must_use]
    pub fn experiment_store(&self) -> AbExperimentStore {
        AbExperimentStore::new(&self.config.state_dir, &self.agent_id)
    }
}
