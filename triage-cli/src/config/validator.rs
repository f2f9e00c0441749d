//! Validation for a fully merged [`Config`] — run once, synchronously,
//! before any command executes, per the error taxonomy's "configuration
//! errors... surfaced synchronously, prevent operation."

use super::types::{AdapterConfig, Config};

pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    let weights = config.evaluator_weights;
    let sum = weights.correctness + weights.quality + weights.efficiency + weights.completeness + weights.safety;
    if (sum - 1.0).abs() > 1e-6 {
        anyhow::bail!("evaluator weights must sum to 1.0, got {sum}");
    }

    if let AdapterConfig::Markdown { dir } = &config.adapter {
        if dir.as_os_str().is_empty() {
            anyhow::bail!("markdown adapter requires a non-empty `dir`");
        }
    }

    if config.min_samples_for_significance == 0 {
        anyhow::bail!("min_samples_for_significance must be greater than zero");
    }

    if config.agent_id.trim().is_empty() {
        anyhow::bail!("agent_id must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::EvaluatorWeightsConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn weights_not_summing_to_one_is_rejected() {
        let mut config = Config::default();
        config.evaluator_weights = EvaluatorWeightsConfig { correctness: 0.5, ..config.evaluator_weights };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn markdown_adapter_without_dir_is_rejected() {
        let mut config = Config::default();
        config.adapter = AdapterConfig::Markdown { dir: "".into() };
        assert!(validate_config(&config).is_err());
    }
}
