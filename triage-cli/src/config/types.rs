//! Configuration types for the triage CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use triage_core::evaluator::EvaluationWeights;
use triage_core::ranker::AutoAcceptConfig;

/// Which `TaskSourceAdapter` to wire up. Tagged so an unknown `type` value
/// fails to deserialize with a clear message rather than silently picking a
/// default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterConfig {
    Memory,
    Markdown { dir: PathBuf },
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig::Memory
    }
}

/// Serializable mirror of [`EvaluationWeights`] — the core type is `Copy`
/// but intentionally carries no `serde` impls since it never crosses a
/// persistence boundary inside `triage-core` itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluatorWeightsConfig {
    pub correctness: f64,
    pub quality: f64,
    pub efficiency: f64,
    pub completeness: f64,
    pub safety: f64,
}

impl Default for EvaluatorWeightsConfig {
    fn default() -> Self {
        let defaults = EvaluationWeights::default();
        Self {
            correctness: defaults.correctness,
            quality: defaults.quality,
            efficiency: defaults.efficiency,
            completeness: defaults.completeness,
            safety: defaults.safety,
        }
    }
}

impl From<EvaluatorWeightsConfig> for EvaluationWeights {
    fn from(value: EvaluatorWeightsConfig) -> Self {
        EvaluationWeights {
            correctness: value.correctness,
            quality: value.quality,
            efficiency: value.efficiency,
            completeness: value.completeness,
            safety: value.safety,
        }
    }
}

/// Serializable mirror of [`AutoAcceptConfig`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AutoAcceptSettings {
    pub min_score: f64,
    pub min_confidence: f64,
    pub min_margin: f64,
}

impl Default for AutoAcceptSettings {
    fn default() -> Self {
        let defaults = AutoAcceptConfig::default();
        Self {
            min_score: defaults.min_score,
            min_confidence: defaults.min_confidence,
            min_margin: defaults.min_margin,
        }
    }
}

impl From<AutoAcceptSettings> for AutoAcceptConfig {
    fn from(value: AutoAcceptSettings) -> Self {
        AutoAcceptConfig {
            min_score: value.min_score,
            min_confidence: value.min_confidence,
            min_margin: value.min_margin,
        }
    }
}

/// Shell commands backing the evaluator's four automated checks. A `None`
/// entry means that check is skipped (reported as passing) rather than
/// failed, since not every project has e.g. a separate typecheck step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandsConfig {
    pub tests: Option<String>,
    pub typecheck: Option<String>,
    pub lint: Option<String>,
    pub build: Option<String>,
}

/// The full, validated configuration driving one CLI invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub adapter: AdapterConfig,
    pub state_dir: PathBuf,
    pub evaluator_weights: EvaluatorWeightsConfig,
    pub auto_accept: AutoAcceptSettings,
    pub min_samples_for_significance: u64,
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
}

fn default_agent_id() -> String {
    "default-agent".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adapter: AdapterConfig::default(),
            state_dir: PathBuf::from(".triage"),
            evaluator_weights: EvaluatorWeightsConfig::default(),
            auto_accept: AutoAcceptSettings::default(),
            min_samples_for_significance: 30,
            poll_interval_ms: 1000,
            commands: CommandsConfig::default(),
            agent_id: default_agent_id(),
        }
    }
}
