//! `confidence = base × recency × consistency`.

use crate::scoring::clamp01;

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceParams {
    pub min_observations_for_full_confidence: u32,
    pub recency_half_life_days: f64,
}

impl Default for ConfidenceParams {
    fn default() -> Self {
        Self { min_observations_for_full_confidence: 10, recency_half_life_days: 14.0 }
    }
}

#[must_use]
pub fn compute_confidence(
    observation_count: u32,
    days_since_last_observed: f64,
    consistency: f64,
    params: &ConfidenceParams,
) -> f64 {
    let base = (f64::from(observation_count) / f64::from(params.min_observations_for_full_confidence)).min(1.0);
    let recency = (-days_since_last_observed.max(0.0) / params.recency_half_life_days.max(f64::EPSILON)).exp();
    clamp01(base * recency * clamp01(consistency))
}

#[derive(Debug, Clone, Copy)]
pub struct ActivationParams {
    pub activation_threshold: f64,
    pub min_observations: u32,
}

impl Default for ActivationParams {
    fn default() -> Self {
        Self { activation_threshold: 0.4, min_observations: 3 }
    }
}

#[must_use]
pub fn is_active(confidence: f64, observation_count: u32, params: &ActivationParams) -> bool {
    confidence >= params.activation_threshold && observation_count >= params.min_observations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_observations_and_fresh_recency_is_near_max() {
        let confidence = compute_confidence(10, 0.0, 1.0, &ConfidenceParams::default());
        assert!((confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_observations_scale_base_linearly() {
        let confidence = compute_confidence(5, 0.0, 1.0, &ConfidenceParams::default());
        assert!((confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn stale_observations_decay_via_recency() {
        let fresh = compute_confidence(10, 0.0, 1.0, &ConfidenceParams::default());
        let stale = compute_confidence(10, 30.0, 1.0, &ConfidenceParams::default());
        assert!(stale < fresh);
    }

    #[test]
    fn activation_requires_both_thresholds() {
        let params = ActivationParams::default();
        assert!(!is_active(0.5, 2, &params));
        assert!(!is_active(0.3, 5, &params));
        assert!(is_active(0.5, 5, &params));
    }
}
