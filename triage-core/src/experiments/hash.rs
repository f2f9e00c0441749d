//! Deterministic session/experiment bucketing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash `session_key` and `experiment_id` together into a value uniformly
/// distributed over `[0, 1)`. Deterministic for identical inputs, including
/// across processes, since `DefaultHasher`'s keys are fixed rather than
/// per-process random.
#[must_use]
pub fn stable_unit_interval(session_key: &str, experiment_id: &str) -> f64 {
    let mut hasher = DefaultHasher::new();
    session_key.hash(&mut hasher);
    0u8.hash(&mut hasher);
    experiment_id.hash(&mut hasher);
    let bucket = hasher.finish();
    (bucket as f64) / (u64::MAX as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_value() {
        assert_eq!(
            stable_unit_interval("session-1", "exp-1"),
            stable_unit_interval("session-1", "exp-1")
        );
    }

    #[test]
    fn different_sessions_usually_differ() {
        assert_ne!(
            stable_unit_interval("session-1", "exp-1"),
            stable_unit_interval("session-2", "exp-1")
        );
    }

    #[test]
    fn result_is_within_unit_interval() {
        for i in 0..50 {
            let v = stable_unit_interval(&format!("session-{i}"), "exp-1");
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn concatenation_boundary_does_not_collide_keys() {
        assert_ne!(
            stable_unit_interval("ab", "c"),
            stable_unit_interval("a", "bc")
        );
    }
}
