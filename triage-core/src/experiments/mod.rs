//! A/B strategy experiments: deterministic variant assignment, exposure and
//! outcome accounting, and graduation. Persistence of assignments/metrics
//! lives in `triage-cli`'s per-agent state file; this module only computes.

mod hash;

pub use hash::stable_unit_interval;

use crate::types::{Experiment, SessionKey, VariantId, VariantMetric};

/// Deterministically assign `session_key` to a variant of `experiment`, or
/// `None` if the session falls outside `traffic_allocation`. Identical
/// inputs always produce the identical result, across processes.
#[must_use]
pub fn assign_variant(experiment: &Experiment, session_key: &SessionKey) -> Option<VariantId> {
    if experiment.variants.is_empty() {
        return None;
    }
    let h = stable_unit_interval(session_key.as_str(), experiment.id.as_str());
    if h >= experiment.traffic_allocation {
        return None;
    }
    let index = ((h * experiment.variants.len() as f64) as usize).min(experiment.variants.len() - 1);
    Some(experiment.variants[index].id.clone())
}

#[derive(Debug, Clone)]
pub struct GraduationResult {
    pub winning_variant: Option<VariantId>,
    pub metrics: Vec<VariantMetric>,
}

/// Names a winning variant only once `total_samples` across all variants
/// reaches `min_samples_for_significance` and the leader's margin over the
/// runner-up is large enough (`success_rate` lead ≥ 0.15, or `confidence` ≥
/// 0.9).
#[must_use]
pub fn calculate_experiment_results(
    metrics: Vec<VariantMetric>,
    min_samples_for_significance: u64,
) -> GraduationResult {
    let total_samples: u64 = metrics.iter().map(|m| m.exposures).sum();
    if total_samples < min_samples_for_significance || metrics.len() < 2 {
        return GraduationResult { winning_variant: None, metrics };
    }

    let mut sorted: Vec<&VariantMetric> = metrics.iter().collect();
    sorted.sort_by(|a, b| {
        b.success_rate().partial_cmp(&a.success_rate()).unwrap_or(std::cmp::Ordering::Equal)
    });

    let winning_variant = match (sorted.first(), sorted.get(1)) {
        (Some(best), Some(next)) => {
            let lead = best.success_rate() - next.success_rate();
            (lead >= 0.15 || best.confidence(min_samples_for_significance) >= 0.9)
                .then(|| best.variant_id.clone())
        }
        _ => None,
    };

    GraduationResult { winning_variant, metrics }
}

/// Enumerate active experiments, assign and record a variant for each, and
/// render the system-prompt addendum. Empty string if no active experiment
/// yields an enrolled assignment.
#[must_use]
pub fn build_strategy_instruction(assignments: &[(Experiment, Option<String>)]) -> String {
    let bullets: Vec<&str> = assignments
        .iter()
        .filter(|(experiment, _)| experiment.active)
        .filter_map(|(_, instruction)| instruction.as_deref())
        .collect();

    if bullets.is_empty() {
        return String::new();
    }

    let mut out = String::from("Response strategy guidelines:\n");
    for bullet in bullets {
        out.push_str("- ");
        out.push_str(bullet);
        out.push('\n');
    }
    out
}
