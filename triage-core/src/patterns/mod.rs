//! Pattern tracking: incremental observation matching, the batch detector,
//! and confidence/merge logic. Nothing here touches a database — the store
//! crate owns persistence and calls into these pure functions with whatever
//! rows it has already loaded.

pub mod confidence;
pub mod detector;
pub mod similarity;

pub use confidence::{compute_confidence, is_active, ActivationParams, ConfidenceParams};
pub use detector::{
    cluster_context_observations, cluster_event_observations, cluster_time_observations, DetectorConfig,
    PatternCandidate,
};
pub use similarity::{keyword_overlap_ratio, similar_text, time_of_day_distance_minutes};

use crate::types::{ObservationPayload, Pattern, PatternDescriptor, PatternObservation, PatternType};

/// Find an existing pattern that `observation` should increment, per the
/// similarity rules of §4.6 for the observation's own type.
#[must_use]
pub fn find_matching_pattern<'a>(
    existing: &'a [Pattern],
    observation: &PatternObservation,
    tolerance_minutes: u32,
) -> Option<&'a Pattern> {
    existing.iter().find(|pattern| matches_pattern(pattern, observation, tolerance_minutes))
}

fn matches_pattern(pattern: &Pattern, observation: &PatternObservation, tolerance_minutes: u32) -> bool {
    match (&pattern.descriptor, &observation.payload) {
        (
            PatternDescriptor::Time { typical_action, time_of_day_minutes, .. },
            ObservationPayload::Time { action },
        ) => {
            use chrono::Timelike;
            let minute = observation.timestamp.hour() * 60 + observation.timestamp.minute();
            similar_text(typical_action, action)
                && time_of_day_distance_minutes(minute, *time_of_day_minutes) <= tolerance_minutes
        }
        (
            PatternDescriptor::Event { typical_event, typical_follow_up, .. },
            ObservationPayload::Event { event, follow_up, .. },
        ) => typical_event == event && similar_text(typical_follow_up, follow_up),
        (
            PatternDescriptor::Context { need, keywords, .. },
            ObservationPayload::Context { need: obs_need, keywords: obs_keywords, .. },
        ) => need == obs_need && keyword_overlap_ratio(obs_keywords, keywords) >= 0.3,
        _ => false,
    }
}

/// Increment an existing pattern with a freshly matched observation,
/// recomputing confidence from the new observation count and timestamp.
#[must_use]
pub fn increment_pattern(
    mut pattern: Pattern,
    observed_at: chrono::DateTime<chrono::Utc>,
    consistency: f64,
    confidence_params: &ConfidenceParams,
    activation_params: &ActivationParams,
) -> Pattern {
    pattern.observation_count += 1;
    pattern.last_observed = pattern.last_observed.max(observed_at);
    pattern.confidence = compute_confidence(pattern.observation_count, 0.0, consistency, confidence_params);
    pattern.active = is_active(pattern.confidence, pattern.observation_count, activation_params);
    pattern
}

fn candidate_matches_existing(existing: &Pattern, candidate: &PatternCandidate) -> bool {
    match (&existing.descriptor, &candidate.descriptor) {
        (
            PatternDescriptor::Time { typical_action: a, .. },
            PatternDescriptor::Time { typical_action: b, .. },
        ) => similar_text(a, b),
        (
            PatternDescriptor::Event { typical_follow_up: a, .. },
            PatternDescriptor::Event { typical_follow_up: b, .. },
        ) => similar_text(a, b),
        (PatternDescriptor::Context { need: a, keywords: ka, .. }, PatternDescriptor::Context { need: b, keywords: kb, .. }) => {
            a == b && keyword_overlap_ratio(kb, ka) >= 0.5
        }
        _ => false,
    }
}

/// Merge freshly detected candidates into the agent's existing pattern set:
/// matching candidates update in place (max confidence, summed observation
/// count, max last_observed); unmatched candidates are appended as new
/// patterns. If the result exceeds `max_patterns_per_agent`, only the
/// highest-confidence patterns are kept.
#[must_use]
pub fn merge_patterns(
    mut existing: Vec<Pattern>,
    detected: Vec<PatternCandidate>,
    mut next_id: impl FnMut() -> crate::types::PatternId,
    agent_id: &crate::types::AgentId,
    confidence_params: &ConfidenceParams,
    activation_params: &ActivationParams,
    max_patterns_per_agent: usize,
) -> Vec<Pattern> {
    for candidate in detected {
        let merge_target = existing.iter_mut().find(|p| candidate_matches_existing(p, &candidate));
        match merge_target {
            Some(pattern) => {
                let candidate_confidence =
                    compute_confidence(candidate.observation_count, 0.0, candidate.consistency, confidence_params);
                pattern.confidence = pattern.confidence.max(candidate_confidence);
                pattern.observation_count += candidate.observation_count;
                pattern.last_observed = pattern.last_observed.max(candidate.last_observed);
                pattern.first_observed = pattern.first_observed.min(candidate.first_observed);
                pattern.active = is_active(pattern.confidence, pattern.observation_count, activation_params);
            }
            None => {
                let confidence =
                    compute_confidence(candidate.observation_count, 0.0, candidate.consistency, confidence_params);
                let active = is_active(confidence, candidate.observation_count, activation_params);
                existing.push(Pattern {
                    id: next_id(),
                    agent_id: agent_id.clone(),
                    pattern_type: candidate.pattern_type,
                    description: describe(&candidate.descriptor),
                    confidence,
                    observation_count: candidate.observation_count,
                    first_observed: candidate.first_observed,
                    last_observed: candidate.last_observed,
                    active,
                    linked_reminder_id: None,
                    descriptor: candidate.descriptor,
                });
            }
        }
    }

    if existing.len() > max_patterns_per_agent {
        existing.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        existing.truncate(max_patterns_per_agent);
    }

    existing
}

fn describe(descriptor: &PatternDescriptor) -> String {
    match descriptor {
        PatternDescriptor::Time { typical_action, .. } => format!("Recurring action: {typical_action}"),
        PatternDescriptor::Event { typical_event, typical_follow_up, .. } => {
            format!("After {typical_event}, usually {typical_follow_up}")
        }
        PatternDescriptor::Context { need, .. } => format!("Recurring need: {need}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentId;
    use chrono::Utc;

    fn sample_pattern() -> Pattern {
        Pattern {
            id: crate::types::PatternId::from("p1"),
            agent_id: AgentId::from("a1"),
            pattern_type: PatternType::TimeBased,
            description: "Recurring action: check email".to_string(),
            confidence: 0.5,
            observation_count: 3,
            first_observed: Utc::now(),
            last_observed: Utc::now(),
            active: true,
            linked_reminder_id: None,
            descriptor: PatternDescriptor::Time {
                typical_action: "check email".to_string(),
                time_of_day_minutes: 540,
                tolerance_minutes: 30,
                day_of_week: None,
            },
        }
    }

    #[test]
    fn matching_observation_finds_existing_pattern() {
        let existing = vec![sample_pattern()];
        let observation = PatternObservation {
            agent_id: AgentId::from("a1"),
            timestamp: Utc::now(),
            payload: ObservationPayload::Time { action: "check email".to_string() },
        };
        assert!(find_matching_pattern(&existing, &observation, 30).is_some());
    }

    #[test]
    fn merge_patterns_caps_at_max_per_agent() {
        let mut id_counter = 0;
        let next_id = move || {
            id_counter += 1;
            crate::types::PatternId::from(format!("p{id_counter}"))
        };
        let candidates: Vec<PatternCandidate> = (0..5)
            .map(|i| PatternCandidate {
                pattern_type: PatternType::TimeBased,
                descriptor: PatternDescriptor::Time {
                    typical_action: format!("action {i}"),
                    time_of_day_minutes: 0,
                    tolerance_minutes: 30,
                    day_of_week: None,
                },
                observation_count: 3,
                consistency: 1.0,
                first_observed: Utc::now(),
                last_observed: Utc::now(),
            })
            .collect();
        let merged = merge_patterns(
            Vec::new(),
            candidates,
            next_id,
            &AgentId::from("a1"),
            &ConfidenceParams::default(),
            &ActivationParams::default(),
            3,
        );
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn merge_patterns_updates_matching_existing_in_place() {
        let mut id_counter = 0;
        let next_id = move || {
            id_counter += 1;
            crate::types::PatternId::from(format!("p{id_counter}"))
        };
        let existing = vec![sample_pattern()];
        let candidate = PatternCandidate {
            pattern_type: PatternType::TimeBased,
            descriptor: PatternDescriptor::Time {
                typical_action: "check email".to_string(),
                time_of_day_minutes: 545,
                tolerance_minutes: 30,
                day_of_week: None,
            },
            observation_count: 4,
            consistency: 1.0,
            first_observed: Utc::now(),
            last_observed: Utc::now(),
        };
        let merged = merge_patterns(
            existing,
            vec![candidate],
            next_id,
            &AgentId::from("a1"),
            &ConfidenceParams::default(),
            &ActivationParams::default(),
            100,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].observation_count, 7);
    }
}
