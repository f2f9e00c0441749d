//! Aggregation strategies that fold a set of completed results into the
//! single answer a plan ultimately reports. Pure; oblivious to why results
//! arrived in whatever order they did (see [`AggregationStrategy::ensemble`]
//! idempotence requirement below).

use crate::types::IterationResult;

const ENSEMBLE_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationStrategy {
    Best,
    Voting,
    Consensus,
    Ensemble,
}

#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub selected: Vec<String>,
    pub confidence: f64,
    pub reasoning: String,
}

fn no_successful_results() -> AggregateOutcome {
    AggregateOutcome {
        selected: Vec::new(),
        confidence: 0.0,
        reasoning: "No successful results to aggregate".to_string(),
    }
}

/// Group successful results by exact output string equality, preserving
/// first-seen group order so grouping (and hence aggregation) is invariant
/// to input permutation only in composition, never in raw insertion order.
fn group_by_output<'a>(results: &'a [&'a IterationResult]) -> Vec<Vec<&'a IterationResult>> {
    let mut groups: Vec<Vec<&'a IterationResult>> = Vec::new();
    for result in results {
        if let Some(group) = groups.iter_mut().find(|g| g[0].output == result.output) {
            group.push(result);
        } else {
            groups.push(vec![*result]);
        }
    }
    groups
}

/// Aggregate `results` under `strategy`. `score_of` supplies each result's
/// `overall_score` (see [`crate::runner::result_scoring::score_result`]).
#[must_use]
pub fn aggregate(
    results: &[IterationResult],
    strategy: AggregationStrategy,
    score_of: impl Fn(&IterationResult) -> f64,
) -> AggregateOutcome {
    let successful: Vec<&IterationResult> = results.iter().filter(|r| r.success).collect();
    if successful.is_empty() {
        return no_successful_results();
    }

    match strategy {
        AggregationStrategy::Best => {
            let best = successful
                .iter()
                .max_by(|a, b| score_of(a).partial_cmp(&score_of(b)).unwrap_or(std::cmp::Ordering::Equal))
                .expect("non-empty checked above");
            AggregateOutcome {
                selected: vec![best.output.clone()],
                confidence: score_of(best),
                reasoning: "Highest overall_score among successful results".to_string(),
            }
        }
        AggregationStrategy::Voting => {
            let groups = group_by_output(&successful);
            let winner = groups
                .into_iter()
                .max_by_key(|g| g.len())
                .expect("non-empty checked above");
            let confidence = winner.len() as f64 / successful.len() as f64;
            AggregateOutcome {
                selected: vec![winner[0].output.clone()],
                confidence,
                reasoning: format!("Most frequent output ({}/{} agree)", winner.len(), successful.len()),
            }
        }
        AggregationStrategy::Consensus => {
            let groups = group_by_output(&successful);
            let winner = groups
                .into_iter()
                .max_by_key(|g| g.len())
                .expect("non-empty checked above");
            let damp = if successful.len() > 1 { 0.9 } else { 0.7 };
            AggregateOutcome {
                selected: vec![winner[0].output.clone()],
                confidence: (winner.len() as f64 / successful.len() as f64).min(1.0) * damp,
                reasoning: "Most common output, confidence dampened pending broader consensus".to_string(),
            }
        }
        AggregationStrategy::Ensemble => {
            let combined = successful
                .iter()
                .map(|r| r.output.as_str())
                .collect::<Vec<_>>()
                .join(ENSEMBLE_SEPARATOR);
            let mean = successful.iter().map(|r| score_of(r)).sum::<f64>() / successful.len() as f64;
            AggregateOutcome {
                selected: vec![combined],
                confidence: mean,
                reasoning: format!("All {} successful outputs combined", successful.len()),
            }
        }
    }
}
