//! Result collection and completion-criteria evaluation for an in-flight
//! [`crate::types::IterationPlan`].
//!
//! `isComplete()` is monotonic: once it reports done for a given
//! `variations_count`, appending more results can never flip it back.

use crate::types::{CompletionCriteria, IterationResult, VariationId};

/// Invoked once per variation, in insertion order, as results land.
pub trait ResultListener {
    fn on_result(&mut self, result: &IterationResult);
}

pub struct ResultCollector<'a> {
    criteria: CompletionCriteria,
    variations_count: usize,
    results: Vec<IterationResult>,
    listeners: Vec<Box<dyn ResultListener + 'a>>,
}

impl<'a> ResultCollector<'a> {
    #[must_use]
    pub fn new(criteria: CompletionCriteria, variations_count: usize) -> Self {
        Self { criteria, variations_count, results: Vec::new(), listeners: Vec::new() }
    }

    pub fn add_listener(&mut self, listener: impl ResultListener + 'a) {
        self.listeners.push(Box::new(listener));
    }

    /// Insert a result and notify listeners. Calling this more than once for
    /// the same `variation_id` is a caller bug but is tolerated — each call
    /// fires its listener exactly once, per the "at most once per variation"
    /// contract holding as long as callers insert each variation only once.
    pub fn insert(&mut self, result: IterationResult) {
        for listener in &mut self.listeners {
            listener.on_result(&result);
        }
        self.results.push(result);
    }

    #[must_use]
    pub fn results(&self) -> &[IterationResult] {
        &self.results
    }

    #[must_use]
    pub fn result_for(&self, variation_id: &VariationId) -> Option<&IterationResult> {
        self.results.iter().find(|r| &r.variation_id == variation_id)
    }

    fn successful_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        if let Some(min_score) = self.criteria.min_acceptable_score {
            if self
                .results
                .iter()
                .any(|r| r.success && r.metrics.overall_score >= min_score)
            {
                return true;
            }
        }
        if let Some(min_variations) = self.criteria.min_successful_variations {
            if self.successful_count() >= min_variations {
                return true;
            }
        }
        if self.criteria.stop_on_first_success && self.successful_count() >= 1 {
            return true;
        }
        if self.criteria.wait_for_all && self.results.len() >= self.variations_count {
            return true;
        }
        self.results.len() >= self.variations_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutputType, ResultMetrics, RunId, SessionKey, UsageMetrics};
    use chrono::Utc;

    fn result(id: &str, success: bool, overall_score: f64) -> IterationResult {
        IterationResult {
            variation_id: VariationId::from(id),
            run_id: RunId::from("r"),
            session_key: SessionKey::from("s"),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            duration_ms: 10,
            output: String::new(),
            output_type: OutputType::Text,
            metrics: ResultMetrics { overall_score, ..ResultMetrics::default() },
            usage: UsageMetrics::default(),
            success,
            error: None,
        }
    }

    #[test]
    fn stop_on_first_success_fires_immediately() {
        let criteria = CompletionCriteria { stop_on_first_success: true, ..CompletionCriteria::default() };
        let mut collector = ResultCollector::new(criteria, 5);
        assert!(!collector.is_complete());
        collector.insert(result("v1", true, 0.1));
        assert!(collector.is_complete());
    }

    #[test]
    fn min_acceptable_score_requires_a_successful_result_meeting_it() {
        let criteria = CompletionCriteria { min_acceptable_score: Some(0.8), ..CompletionCriteria::default() };
        let mut collector = ResultCollector::new(criteria, 5);
        collector.insert(result("v1", true, 0.5));
        assert!(!collector.is_complete());
        collector.insert(result("v2", true, 0.9));
        assert!(collector.is_complete());
    }

    #[test]
    fn min_successful_variations_counts_only_successes() {
        let criteria = CompletionCriteria { min_successful_variations: Some(2), ..CompletionCriteria::default() };
        let mut collector = ResultCollector::new(criteria, 5);
        collector.insert(result("v1", false, 0.0));
        collector.insert(result("v2", true, 0.2));
        assert!(!collector.is_complete());
        collector.insert(result("v3", true, 0.3));
        assert!(collector.is_complete());
    }

    #[test]
    fn default_fallback_requires_all_variations_reported() {
        let collector_criteria = CompletionCriteria::default();
        let mut collector = ResultCollector::new(collector_criteria, 2);
        collector.insert(result("v1", false, 0.0));
        assert!(!collector.is_complete());
        collector.insert(result("v2", false, 0.0));
        assert!(collector.is_complete());
    }

    #[test]
    fn is_complete_is_monotonic() {
        let criteria = CompletionCriteria { min_successful_variations: Some(1), ..CompletionCriteria::default() };
        let mut collector = ResultCollector::new(criteria, 5);
        collector.insert(result("v1", true, 0.1));
        assert!(collector.is_complete());
        collector.insert(result("v2", false, 0.0));
        assert!(collector.is_complete());
    }

    struct CountingListener {
        count: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl ResultListener for CountingListener {
        fn on_result(&mut self, _result: &IterationResult) {
            self.count.set(self.count.get() + 1);
        }
    }

    #[test]
    fn listener_fires_once_per_inserted_result() {
        let count = std::rc::Rc::new(std::cell::Cell::new(0));
        let criteria = CompletionCriteria::default();
        let mut collector = ResultCollector::new(criteria, 2);
        collector.add_listener(CountingListener { count: count.clone() });
        collector.insert(result("v1", true, 0.1));
        collector.insert(result("v2", true, 0.2));
        assert_eq!(count.get(), 2);
    }
}
