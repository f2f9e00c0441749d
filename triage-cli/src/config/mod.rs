//! Layered configuration: defaults → optional file → environment overrides
//! → CLI flags, validated before use. Mirrors the teacher's
//! `memory-cli/src/config` split into a `loader` and a `types`/`validator`
//! module, trimmed to the single `Config` shape this pipeline needs.

mod loader;
mod types;
mod validator;

pub use loader::{apply_env_overrides, load_config};
pub use types::{AdapterConfig, AutoAcceptSettings, CommandsConfig, Config, EvaluatorWeightsConfig};
pub use validator::validate_config;

/// Load, env-override, and validate in one call — the entry point `main`
/// uses before applying CLI-flag overrides and wiring storage/adapters.
pub fn load_and_validate(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}
