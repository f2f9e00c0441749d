//! Pattern detector: a batch pass over an agent's recent observations that
//! clusters them into candidate patterns, independent of the incremental
//! per-observation matching in [`super::find_matching_pattern`].

use super::similarity::{keyword_overlap_ratio, similar_text, time_of_day_distance_minutes};
use crate::types::{ObservationPayload, PatternDescriptor, PatternObservation, PatternType};

#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub min_observations: u32,
    pub time_tolerance_minutes: u32,
    pub min_context_overlap_ratio: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { min_observations: 3, time_tolerance_minutes: 30, min_context_overlap_ratio: 0.3 }
    }
}

/// A batch-detected cluster, prior to merging against existing patterns.
#[derive(Debug, Clone)]
pub struct PatternCandidate {
    pub pattern_type: PatternType,
    pub descriptor: PatternDescriptor,
    pub observation_count: u32,
    pub consistency: f64,
    pub first_observed: chrono::DateTime<chrono::Utc>,
    pub last_observed: chrono::DateTime<chrono::Utc>,
}

fn minutes_since_midnight(t: chrono::DateTime<chrono::Utc>) -> u32 {
    use chrono::Timelike;
    t.hour() * 60 + t.minute()
}

fn mean_and_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

fn most_frequent<'a>(items: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        if let Some(entry) = counts.iter_mut().find(|(k, _)| k == item) {
            entry.1 += 1;
        } else {
            counts.push((item.to_string(), 1));
        }
    }
    counts.into_iter().max_by_key(|(_, c)| *c).map(|(k, _)| k)
}

/// Greedy clustering by `similar_text(action)` and time-of-day tolerance.
/// Clusters landing on at most 3 distinct weekdays emit a day-of-week
/// trigger (the most frequent day); otherwise a time-of-day trigger using
/// the mean minute-of-day.
#[must_use]
pub fn cluster_time_observations(
    observations: &[&PatternObservation],
    config: &DetectorConfig,
) -> Vec<PatternCandidate> {
    let mut clusters: Vec<Vec<&PatternObservation>> = Vec::new();
    for obs in observations {
        let ObservationPayload::Time { action } = &obs.payload else { continue };
        let minute = minutes_since_midnight(obs.timestamp);
        let placed = clusters.iter_mut().find(|cluster| {
            let ObservationPayload::Time { action: rep_action } = &cluster[0].payload else { return false };
            let rep_minute = minutes_since_midnight(cluster[0].timestamp);
            similar_text(action, rep_action)
                && time_of_day_distance_minutes(minute, rep_minute) <= config.time_tolerance_minutes
        });
        match placed {
            Some(cluster) => cluster.push(obs),
            None => clusters.push(vec![obs]),
        }
    }

    clusters
        .into_iter()
        .filter(|c| c.len() as u32 >= config.min_observations)
        .map(|cluster| {
            use chrono::Datelike;
            let minutes: Vec<f64> = cluster.iter().map(|o| f64::from(minutes_since_midnight(o.timestamp))).collect();
            let (mean_minute, stddev) = mean_and_stddev(&minutes);
            let consistency = (-stddev / 60.0).exp();

            let weekdays: Vec<chrono::Weekday> = cluster.iter().map(|o| o.timestamp.weekday()).collect();
            let distinct_days: std::collections::HashSet<chrono::Weekday> = weekdays.iter().copied().collect();
            let day_of_week = (distinct_days.len() <= 3)
                .then(|| most_frequent(weekdays.iter().map(|w| day_name(*w))))
                .flatten();

            let ObservationPayload::Time { action } = &cluster[0].payload else { unreachable!() };
            let first = cluster.iter().map(|o| o.timestamp).min().unwrap();
            let last = cluster.iter().map(|o| o.timestamp).max().unwrap();

            PatternCandidate {
                pattern_type: PatternType::TimeBased,
                descriptor: PatternDescriptor::Time {
                    typical_action: action.clone(),
                    time_of_day_minutes: mean_minute as u32,
                    tolerance_minutes: config.time_tolerance_minutes,
                    day_of_week,
                },
                observation_count: cluster.len() as u32,
                consistency,
                first_observed: first,
                last_observed: last,
            }
        })
        .collect()
}

fn day_name(day: chrono::Weekday) -> &'static str {
    match day {
        chrono::Weekday::Mon => "mon",
        chrono::Weekday::Tue => "tue",
        chrono::Weekday::Wed => "wed",
        chrono::Weekday::Thu => "thu",
        chrono::Weekday::Fri => "fri",
        chrono::Weekday::Sat => "sat",
        chrono::Weekday::Sun => "sun",
    }
}

/// Group by `(event, followUp-similarity)`; `typical_delay` is the mean
/// delay, `consistency = exp(-coefficient_of_variation)`, `expiration_s`
/// is `max(2 * max_delay, 300)`.
#[must_use]
pub fn cluster_event_observations(
    observations: &[&PatternObservation],
    config: &DetectorConfig,
) -> Vec<PatternCandidate> {
    let mut clusters: Vec<Vec<&PatternObservation>> = Vec::new();
    for obs in observations {
        let ObservationPayload::Event { event, follow_up, .. } = &obs.payload else { continue };
        let placed = clusters.iter_mut().find(|cluster| {
            let ObservationPayload::Event { event: rep_event, follow_up: rep_follow_up, .. } = &cluster[0].payload
            else {
                return false;
            };
            event == rep_event && similar_text(follow_up, rep_follow_up)
        });
        match placed {
            Some(cluster) => cluster.push(obs),
            None => clusters.push(vec![obs]),
        }
    }

    clusters
        .into_iter()
        .filter(|c| c.len() as u32 >= config.min_observations)
        .map(|cluster| {
            let delays: Vec<f64> = cluster
                .iter()
                .filter_map(|o| match &o.payload {
                    ObservationPayload::Event { delay_s, .. } => Some(*delay_s),
                    _ => None,
                })
                .collect();
            let (mean_delay, stddev) = mean_and_stddev(&delays);
            let cv = if mean_delay.abs() < f64::EPSILON { 0.0 } else { stddev / mean_delay };
            let consistency = (-cv).exp();
            let max_delay = delays.iter().copied().fold(0.0_f64, f64::max);

            let ObservationPayload::Event { event, follow_up, .. } = &cluster[0].payload else { unreachable!() };
            let first = cluster.iter().map(|o| o.timestamp).min().unwrap();
            let last = cluster.iter().map(|o| o.timestamp).max().unwrap();

            PatternCandidate {
                pattern_type: PatternType::EventBased,
                descriptor: PatternDescriptor::Event {
                    typical_event: event.clone(),
                    typical_follow_up: follow_up.clone(),
                    typical_delay_s: mean_delay,
                    expiration_s: (2.0 * max_delay).max(300.0),
                },
                observation_count: cluster.len() as u32,
                consistency,
                first_observed: first,
                last_observed: last,
            }
        })
        .collect()
}

/// Cluster by same `need` plus keyword overlap ≥ `min_context_overlap_ratio`.
/// Representative keywords are the top-5 most frequent across the cluster.
#[must_use]
pub fn cluster_context_observations(
    observations: &[&PatternObservation],
    config: &DetectorConfig,
) -> Vec<PatternCandidate> {
    let mut clusters: Vec<Vec<&PatternObservation>> = Vec::new();
    for obs in observations {
        let ObservationPayload::Context { keywords, need, .. } = &obs.payload else { continue };
        let placed = clusters.iter_mut().find(|cluster| {
            let ObservationPayload::Context { keywords: rep_keywords, need: rep_need, .. } = &cluster[0].payload
            else {
                return false;
            };
            need == rep_need && keyword_overlap_ratio(keywords, rep_keywords) >= config.min_context_overlap_ratio
        });
        match placed {
            Some(cluster) => cluster.push(obs),
            None => clusters.push(vec![obs]),
        }
    }

    clusters
        .into_iter()
        .filter(|c| c.len() as u32 >= config.min_observations)
        .map(|cluster| {
            let mut keyword_counts: Vec<(String, usize)> = Vec::new();
            let mut min_similarity: Option<f64> = None;
            let mut use_semantic_matching = false;
            for obs in &cluster {
                if let ObservationPayload::Context { keywords, similarity_score, .. } = &obs.payload {
                    for kw in keywords {
                        if let Some(entry) = keyword_counts.iter_mut().find(|(k, _)| k == kw) {
                            entry.1 += 1;
                        } else {
                            keyword_counts.push((kw.clone(), 1));
                        }
                    }
                    if let Some(score) = similarity_score {
                        use_semantic_matching = true;
                        min_similarity = Some(min_similarity.map_or(*score, |m: f64| m.min(*score)));
                    }
                }
            }
            keyword_counts.sort_by(|a, b| b.1.cmp(&a.1));
            let representative_keywords: Vec<String> = keyword_counts.into_iter().take(5).map(|(k, _)| k).collect();

            let relevance_threshold = min_similarity.map(|m| 0.9 * m).unwrap_or(0.5);

            let ObservationPayload::Context { need, .. } = &cluster[0].payload else { unreachable!() };
            let first = cluster.iter().map(|o| o.timestamp).min().unwrap();
            let last = cluster.iter().map(|o| o.timestamp).max().unwrap();

            PatternCandidate {
                pattern_type: PatternType::ContextBased,
                descriptor: PatternDescriptor::Context {
                    need: need.clone(),
                    keywords: representative_keywords,
                    use_semantic_matching,
                    relevance_threshold,
                },
                observation_count: cluster.len() as u32,
                consistency: 1.0,
                first_observed: first,
                last_observed: last,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentId;
    use chrono::{TimeZone, Utc};

    fn time_obs(action: &str, hour: u32, minute: u32, day_offset: i64) -> PatternObservation {
        let base = Utc.with_ymd_and_hms(2024, 6, 3, hour, minute, 0).unwrap();
        PatternObservation {
            agent_id: AgentId::from("a1"),
            timestamp: base + chrono::Duration::days(day_offset),
            payload: ObservationPayload::Time { action: action.to_string() },
        }
    }

    #[test]
    fn time_cluster_requires_min_observations() {
        let obs = vec![time_obs("check email", 9, 0, 0), time_obs("check email", 9, 5, 1)];
        let refs: Vec<&PatternObservation> = obs.iter().collect();
        let clusters = cluster_time_observations(&refs, &DetectorConfig::default());
        assert!(clusters.is_empty());
    }

    #[test]
    fn time_cluster_groups_similar_actions_within_tolerance() {
        let obs = vec![
            time_obs("check email", 9, 0, 0),
            time_obs("check email", 9, 10, 1),
            time_obs("check email", 8, 50, 2),
        ];
        let refs: Vec<&PatternObservation> = obs.iter().collect();
        let clusters = cluster_time_observations(&refs, &DetectorConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].observation_count, 3);
    }

    fn event_obs(event: &str, follow_up: &str, delay_s: f64) -> PatternObservation {
        PatternObservation {
            agent_id: AgentId::from("a1"),
            timestamp: Utc::now(),
            payload: ObservationPayload::Event { event: event.to_string(), follow_up: follow_up.to_string(), delay_s },
        }
    }

    #[test]
    fn event_cluster_computes_typical_delay_and_expiration() {
        let obs = vec![
            event_obs("deploy", "smoke test", 60.0),
            event_obs("deploy", "smoke test", 80.0),
            event_obs("deploy", "smoke test", 70.0),
        ];
        let refs: Vec<&PatternObservation> = obs.iter().collect();
        let clusters = cluster_event_observations(&refs, &DetectorConfig::default());
        assert_eq!(clusters.len(), 1);
        if let PatternDescriptor::Event { typical_delay_s, expiration_s, .. } = &clusters[0].descriptor {
            assert!((*typical_delay_s - 70.0).abs() < 1e-6);
            assert_eq!(*expiration_s, 300.0);
        } else {
            panic!("expected Event descriptor");
        }
    }

    fn context_obs(keywords: &[&str], need: &str, score: Option<f64>) -> PatternObservation {
        PatternObservation {
            agent_id: AgentId::from("a1"),
            timestamp: Utc::now(),
            payload: ObservationPayload::Context {
                keywords: keywords.iter().map(|s| s.to_string()).collect(),
                need: need.to_string(),
                similarity_score: score,
            },
        }
    }

    #[test]
    fn context_cluster_picks_representative_keywords() {
        let obs = vec![
            context_obs(&["bug", "crash"], "debugging help", None),
            context_obs(&["bug", "stacktrace"], "debugging help", None),
            context_obs(&["bug", "logs"], "debugging help", None),
        ];
        let refs: Vec<&PatternObservation> = obs.iter().collect();
        let clusters = cluster_context_observations(&refs, &DetectorConfig::default());
        assert_eq!(clusters.len(), 1);
        if let PatternDescriptor::Context { keywords, use_semantic_matching, .. } = &clusters[0].descriptor {
            assert!(keywords.contains(&"bug".to_string()));
            assert!(!use_semantic_matching);
        } else {
            panic!("expected Context descriptor");
        }
    }
}
