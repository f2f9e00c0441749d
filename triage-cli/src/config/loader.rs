//! Configuration loader: defaults, then an optional file, then environment
//! variable overrides. CLI flag overrides are applied by the caller in
//! `main`, after `load_config` returns, since they need the parsed [`Cli`]
//! struct which this module doesn't know about.

use std::path::Path;

use anyhow::Context;

use super::types::{AdapterConfig, Config};

const DEFAULT_PATHS: &[&str] = &["triage.toml", "triage.json", ".triage.toml", ".triage.json"];

/// Load configuration from an explicit path, the `TRIAGE_CONFIG` env var, one
/// of the default file names in the current directory, or built-in defaults
/// — in that order of preference.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_file(path),
        None => {
            if let Ok(env_path) = std::env::var("TRIAGE_CONFIG") {
                let path = Path::new(&env_path);
                if path.exists() {
                    tracing::info!("loading configuration from TRIAGE_CONFIG: {}", env_path);
                    return load_file(path);
                }
                tracing::warn!("TRIAGE_CONFIG points to a non-existent file: {}", env_path);
            }

            for candidate in DEFAULT_PATHS {
                let path = Path::new(candidate);
                if path.exists() {
                    tracing::info!("loading configuration from: {}", candidate);
                    return load_file(path);
                }
            }

            tracing::info!("no configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn load_file(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            serde_json::from_str(&content).with_context(|| format!("failed to parse JSON config: {}", path.display()))
        }
        _ => toml::from_str(&content).with_context(|| format!("failed to parse TOML config: {}", path.display())),
    }
}

/// Apply `TRIAGE_*` environment variable overrides on top of a loaded
/// config. Env vars win over the file but lose to explicit CLI flags.
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(dir) = std::env::var("TRIAGE_STATE_DIR") {
        config.state_dir = dir.into();
    }
    if let Ok(adapter) = std::env::var("TRIAGE_ADAPTER") {
        match adapter.as_str() {
            "memory" => config.adapter = AdapterConfig::Memory,
            "markdown" => {
                let dir = std::env::var("TRIAGE_MARKDOWN_DIR").unwrap_or_else(|_| "tasks".to_string());
                config.adapter = AdapterConfig::Markdown { dir: dir.into() };
            }
            other => tracing::warn!("ignoring unknown TRIAGE_ADAPTER value: {other}"),
        }
    }
    if let Ok(samples) = std::env::var("TRIAGE_MIN_SAMPLES") {
        if let Ok(value) = samples.parse() {
            config.min_samples_for_significance = value;
        }
    }
    if let Ok(interval) = std::env::var("TRIAGE_POLL_INTERVAL_MS") {
        if let Ok(value) = interval.parse() {
            config.poll_interval_ms = value;
        }
    }
}
