//! Per-agent A/B experiment state file: one JSON document at
//! `<state_dir>/agents/<agent_id>/ab-experiments.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;
use triage_core::types::{AgentId, Assignment, Experiment, VariantMetric};

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentState {
    pub experiments: Vec<Experiment>,
    pub assignments: Vec<Assignment>,
    pub metrics: Vec<VariantMetric>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Default for ExperimentState {
    fn default() -> Self {
        Self { experiments: Vec::new(), assignments: Vec::new(), metrics: Vec::new(), updated_at: Utc::now() }
    }
}

/// Owns one agent's `ab-experiments.json`. Reads and writes are serialized
/// through an internal mutex so a read-modify-write sequence (assign a
/// variant, bump a metric) is atomic per file.
pub struct AbExperimentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AbExperimentStore {
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>, agent_id: &AgentId) -> Self {
        let path = state_dir.as_ref().join("agents").join(agent_id.as_str()).join("ab-experiments.json");
        Self { path, lock: Mutex::new(()) }
    }

    /// Load current state. A missing file is empty state; a corrupt file is
    /// healed to empty state rather than surfaced as an error, per spec.
    pub async fn load(&self) -> Result<ExperimentState> {
        let _guard = self.lock.lock().await;
        self.load_unlocked().await
    }

    async fn load_unlocked(&self) -> Result<ExperimentState> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), error = %err, "corrupt ab-experiments.json, healing to empty state");
                ExperimentState::default()
            })),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(ExperimentState::default()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    async fn save_unlocked(&self, state: &ExperimentState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, json).await.map_err(Error::Io)?;
        Ok(())
    }

    /// Overwrite the whole document.
    pub async fn save(&self, state: &ExperimentState) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.save_unlocked(state).await
    }

    /// Atomic read-modify-write: load, apply `mutate`, stamp `updated_at`,
    /// persist, and return the new state.
    pub async fn update<F>(&self, mutate: F) -> Result<ExperimentState>
    where
        F: FnOnce(&mut ExperimentState),
    {
        let _guard = self.lock.lock().await;
        let mut state = self.load_unlocked().await?;
        mutate(&mut state);
        state.updated_at = Utc::now();
        self.save_unlocked(&state).await?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::types::{ExperimentId, VariantId};

    #[tokio::test]
    async fn missing_file_loads_as_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = AbExperimentStore::new(dir.path(), &AgentId::from("agent-1"));
        let state = store.load().await.unwrap();
        assert!(state.experiments.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_heals_to_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = AbExperimentStore::new(dir.path(), &AgentId::from("agent-1"));
        let path = dir.path().join("agents").join("agent-1").join("ab-experiments.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"not json").await.unwrap();

        let state = store.load().await.unwrap();
        assert!(state.experiments.is_empty());
    }

    #[tokio::test]
    async fn update_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = AbExperimentStore::new(dir.path(), &AgentId::from("agent-1"));

        store
            .update(|state| {
                state.metrics.push(VariantMetric {
                    experiment_id: ExperimentId::from("exp1"),
                    variant_id: VariantId::from("v0"),
                    exposures: 1,
                    positive_count: 1,
                    negative_count: 0,
                });
            })
            .await
            .unwrap();

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.metrics.len(), 1);
        assert_eq!(reloaded.metrics[0].variant_id, VariantId::from("v0"));
    }
}
