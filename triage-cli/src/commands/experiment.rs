//! `triage experiment`: assign a session to a variant, record an exposure
//! outcome, and check graduation status.

use triage_core::experiments::{assign_variant, calculate_experiment_results};
use triage_core::types::{Assignment, ExperimentId, SessionKey, VariantId, VariantMetric};

use crate::app::App;
use crate::output::{ExperimentStatusView, Output, OutputFormat, VariantMetricView};

/// Assign (or re-confirm) `session_key`'s variant for `experiment_id`,
/// persist the assignment, and — only the first time this session is
/// assigned — increment the variant's exposure count. Per the recording
/// contract, exposures track distinct assigned sessions, not how many times
/// `assign` is called for the same one.
pub async fn assign(app: &App, experiment_id: String, session_key: String) -> anyhow::Result<()> {
    let store = app.experiment_store();
    let state = store.load().await?;
    let Some(experiment) = state.experiments.iter().find(|e| e.id.as_str() == experiment_id) else {
        anyhow::bail!("unknown experiment: {experiment_id}");
    };
    let session = SessionKey::from(session_key.as_str());
    let Some(variant_id) = assign_variant(experiment, &session) else {
        tracing::info!(experiment_id = %experiment_id, session = %session_key, "session not enrolled");
        println!("not enrolled (outside traffic allocation)");
        return Ok(());
    };
    let already_assigned =
        state.assignments.iter().any(|a| a.experiment_id.as_str() == experiment_id && a.session_key == session);

    store
        .update(|state| {
            state.assignments.retain(|a| !(a.experiment_id.as_str() == experiment_id && a.session_key == session));
            state.assignments.push(Assignment {
                experiment_id: ExperimentId::from(experiment_id.as_str()),
                variant_id: variant_id.clone(),
                session_key: session.clone(),
                assigned_at: chrono::Utc::now(),
            });

            if !already_assigned {
                let metric = state
                    .metrics
                    .iter_mut()
                    .find(|m| m.experiment_id.as_str() == experiment_id && m.variant_id == variant_id);
                match metric {
                    Some(metric) => metric.exposures += 1,
                    None => state.metrics.push(VariantMetric {
                        experiment_id: ExperimentId::from(experiment_id.as_str()),
                        variant_id: variant_id.clone(),
                        exposures: 1,
                        positive_count: 0,
                        negative_count: 0,
                    }),
                }
            }
        })
        .await?;

    tracing::info!(experiment_id = %experiment_id, session = %session_key, variant = %variant_id, "A/B assignment recorded");
    println!("assigned to variant {variant_id}");
    Ok(())
}

/// Record one exposure outcome (`success` or not) for a variant. Only
/// updates the positive/negative counters — exposures are credited once per
/// distinct session in [`assign`], never here.
pub async fn record(app: &App, experiment_id: String, variant_id: String, success: bool) -> anyhow::Result<()> {
    let store = app.experiment_store();
    store
        .update(|state| {
            let metric = state
                .metrics
                .iter_mut()
                .find(|m| m.experiment_id.as_str() == experiment_id && m.variant_id.as_str() == variant_id);
            match metric {
                Some(metric) => {
                    if success {
                        metric.positive_count += 1;
                    } else {
                        metric.negative_count += 1;
                    }
                }
                None => {
                    state.metrics.push(VariantMetric {
                        experiment_id: ExperimentId::from(experiment_id.as_str()),
                        variant_id: VariantId::from(variant_id.as_str()),
                        exposures: 0,
                        positive_count: u64::from(success),
                        negative_count: u64::from(!success),
                    });
                }
            }
        })
        .await?;
    Ok(())
}

pub async fn status(app: &App, experiment_id: String, format: OutputFormat) -> anyhow::Result<()> {
    let store = app.experiment_store();
    let state = store.load().await?;
    let metrics: Vec<VariantMetric> = state.metrics.into_iter().filter(|m| m.experiment_id.as_str() == experiment_id).collect();
    let total_exposures: u64 = metrics.iter().map(|m| m.exposures).sum();

    let views: Vec<VariantMetricView> = metrics
        .iter()
        .map(|m| VariantMetricView {
            variant_id: m.variant_id.to_string(),
            exposures: m.exposures,
            success_rate: m.success_rate(),
            confidence: m.confidence(app.config.min_samples_for_significance),
        })
        .collect();

    let result = calculate_experiment_results(metrics, app.config.min_samples_for_significance);
    if let Some(winner) = &result.winning_variant {
        tracing::info!(experiment_id = %experiment_id, winner = %winner, "experiment graduated");
    }

    let view = ExperimentStatusView {
        experiment_id,
        total_exposures,
        winning_variant: result.winning_variant.map(|v| v.to_string()),
        variants: views,
    };
    Output::new(format).write(&view)?;
    Ok(())
}
