//! Iteration limit enforcement: "may I spawn?" under concurrent/total/cost/
//! token/time caps. Mutated only by the owning runner — single-writer.

use crate::types::IterationLimits;
use std::time::{Duration, Instant};

/// Denial reason strings, one per clause of [`LimitEnforcer::can_spawn`].
pub mod deny_reason {
    pub const MAX_CONCURRENT: &str = "Max concurrent iterations reached";
    pub const MAX_TOTAL: &str = "Max total iterations reached";
    pub const TOTAL_TIMEOUT: &str = "Total timeout exceeded";
    pub const TOTAL_COST: &str = "Total cost limit exceeded";
    pub const TOTAL_TOKENS: &str = "Total token limit exceeded";
}
use deny_reason as reason;

/// Tracks running totals against a fixed [`IterationLimits`] envelope.
pub struct LimitEnforcer {
    limits: IterationLimits,
    start_time: Instant,
    active_count: usize,
    completed_count: usize,
    total_cost: f64,
    total_tokens: u64,
}

impl LimitEnforcer {
    #[must_use]
    pub fn new(limits: IterationLimits) -> Self {
        Self {
            limits,
            start_time: Instant::now(),
            active_count: 0,
            completed_count: 0,
            total_cost: 0.0,
            total_tokens: 0,
        }
    }

    fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// First failing clause wins and names the returned reason, checked in
    /// the order: concurrency, total count, elapsed time, cost, tokens.
    #[must_use]
    pub fn can_spawn(&self) -> Result<(), &'static str> {
        if self.active_count >= self.limits.max_concurrent {
            return Err(reason::MAX_CONCURRENT);
        }
        if self.active_count + self.completed_count >= self.limits.max_total {
            return Err(reason::MAX_TOTAL);
        }
        if self.elapsed() >= Duration::from_secs(self.limits.total_timeout_s) {
            return Err(reason::TOTAL_TIMEOUT);
        }
        if let Some(cap) = self.limits.total_cost_cap {
            if self.total_cost > cap {
                return Err(reason::TOTAL_COST);
            }
        }
        if let Some(cap) = self.limits.total_token_cap {
            if self.total_tokens > cap {
                return Err(reason::TOTAL_TOKENS);
            }
        }
        Ok(())
    }

    pub fn record_spawn(&mut self) {
        self.active_count += 1;
    }

    pub fn record_completion(&mut self, cost: f64, tokens: u64) {
        self.active_count = self.active_count.saturating_sub(1);
        self.completed_count += 1;
        self.total_cost += cost;
        self.total_tokens += tokens;
    }

    #[must_use]
    pub fn remaining_time_ms(&self) -> i64 {
        let total_ms = self.limits.total_timeout_s as i64 * 1000;
        let elapsed_ms = self.elapsed().as_millis() as i64;
        (total_ms - elapsed_ms).max(0)
    }

    #[must_use]
    pub fn iteration_timeout_ms(&self) -> i64 {
        let configured = self.limits.per_iteration_timeout_s as i64 * 1000;
        configured.min(self.remaining_time_ms())
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_count
    }
}
