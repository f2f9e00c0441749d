//! `triage pattern`: record an observation, run incremental matching, or run
//! a batch detection pass over recent observations.

use triage_core::patterns::{
    cluster_time_observations, find_matching_pattern, increment_pattern, merge_patterns, ActivationParams,
    ConfidenceParams, DetectorConfig,
};
use triage_core::types::{ObservationPayload, PatternId, PatternObservation, PatternType};

use crate::app::App;
use crate::output::{Output, OutputFormat, PatternList, PatternView};

fn pattern_type_label(kind: PatternType) -> &'static str {
    match kind {
        PatternType::TimeBased => "time_based",
        PatternType::EventBased => "event_based",
        PatternType::ContextBased => "context_based",
    }
}

pub async fn list(app: &App, active_only: bool, format: OutputFormat) -> anyhow::Result<()> {
    let store = app.open_pattern_store().await?;
    let patterns = store.list_patterns(active_only).await?;
    let views = patterns
        .into_iter()
        .map(|p| PatternView {
            id: p.id.to_string(),
            pattern_type: pattern_type_label(p.pattern_type).to_string(),
            description: p.description,
            confidence: p.confidence,
            observation_count: p.observation_count,
            active: p.active,
        })
        .collect();
    Output::new(format).write(&PatternList(views))?;
    Ok(())
}

/// Record a `Time { action }` observation, incrementing a matching pattern
/// if one already exists.
pub async fn observe(app: &App, action: String) -> anyhow::Result<()> {
    let store = app.open_pattern_store().await?;
    let observation = PatternObservation { agent_id: app.agent_id.clone(), timestamp: chrono::Utc::now(), payload: ObservationPayload::Time { action } };
    store.insert_observation(&observation).await?;

    let existing = store.list_patterns(false).await?;
    match find_matching_pattern(&existing, &observation, DetectorConfig::default().time_tolerance_minutes) {
        Some(pattern) => {
            let updated = increment_pattern(
                pattern.clone(),
                observation.timestamp,
                1.0,
                &ConfidenceParams::default(),
                &ActivationParams::default(),
            );
            tracing::info!(pattern_id = %updated.id, confidence = updated.confidence, active = updated.active, "pattern incremented");
            store.upsert_pattern(&updated).await?;
        }
        None => {
            tracing::info!("observation recorded, no matching pattern yet");
        }
    }
    Ok(())
}

/// Batch-cluster recent time observations into candidate patterns and merge
/// them into the agent's stored set.
pub async fn detect(app: &App, max_patterns_per_agent: usize, format: OutputFormat) -> anyhow::Result<()> {
    let store = app.open_pattern_store().await?;
    let observations = store.recent_observations(Some(PatternType::TimeBased), 500).await?;
    let refs: Vec<&PatternObservation> = observations.iter().collect();
    let candidates = cluster_time_observations(&refs, &DetectorConfig::default());

    let existing = store.list_patterns(false).await?;
    let merged = merge_patterns(
        existing,
        candidates,
        || PatternId::from(uuid::Uuid::new_v4().to_string()),
        &app.agent_id,
        &ConfidenceParams::default(),
        &ActivationParams::default(),
        max_patterns_per_agent,
    );

    for pattern in &merged {
        store.upsert_pattern(pattern).await?;
    }
    tracing::info!(pattern_count = merged.len(), "patterns merged from batch detection");

    let views = merged
        .into_iter()
        .map(|p| PatternView {
            id: p.id.to_string(),
            pattern_type: pattern_type_label(p.pattern_type).to_string(),
            description: p.description,
            confidence: p.confidence,
            observation_count: p.observation_count,
            active: p.active,
        })
        .collect();
    Output::new(format).write(&PatternList(views))?;
    Ok(())
}
