//! Deriving an `overall_score` for an [`IterationResult`] from its metrics,
//! or from a fixed penalty when the variation did not succeed.

use crate::scoring::clamp01;
use crate::types::IterationResult;

#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub confidence: f64,
    pub completeness: f64,
    pub code_quality: f64,
    pub responsiveness: f64,
    pub speed: f64,
    pub cost: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            confidence: 0.2,
            completeness: 0.3,
            code_quality: 0.2,
            responsiveness: 0.2,
            speed: 0.05,
            cost: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Penalties {
    pub timeout: f64,
    pub error: f64,
    pub incomplete: f64,
}

impl Default for Penalties {
    fn default() -> Self {
        Self { timeout: 0.5, error: 1.0, incomplete: 0.3 }
    }
}

const SPEED_DURATION_CEILING_MS: f64 = 300_000.0;
const COST_CEILING: f64 = 0.5;

/// Score a single result. Failing results never look at metrics at all —
/// their score is purely penalty-derived, per the invariant that
/// `!success ⇒ overall_score is penalty-derived, not model-derived`.
#[must_use]
pub fn score_result(result: &IterationResult, weights: &ScoringWeights, penalties: &Penalties) -> f64 {
    if !result.success {
        let is_timeout = result
            .error
            .as_deref()
            .map(|e| e.to_lowercase().contains("timeout"))
            .unwrap_or(false);
        return if is_timeout {
            clamp01(1.0 - penalties.timeout)
        } else {
            clamp01(1.0 - penalties.error)
        };
    }

    let mut pairs: Vec<(f64, f64)> = Vec::new();
    if let Some(c) = result.metrics.confidence {
        pairs.push((clamp01(c), weights.confidence));
    }
    if let Some(c) = result.metrics.completeness {
        pairs.push((clamp01(c), weights.completeness));
    }
    if let Some(c) = result.metrics.code_quality {
        pairs.push((clamp01(c), weights.code_quality));
    }
    if let Some(c) = result.metrics.responsiveness {
        pairs.push((clamp01(c), weights.responsiveness));
    }

    let speed_bonus = (1.0 - result.duration_ms as f64 / SPEED_DURATION_CEILING_MS).max(0.0);
    pairs.push((speed_bonus, weights.speed));

    let cost_bonus = (1.0 - result.usage.estimated_cost / COST_CEILING).max(0.0);
    pairs.push((cost_bonus, weights.cost));

    crate::scoring::weighted_average(&pairs)
}
