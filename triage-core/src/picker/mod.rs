//! Task picker: filter, score, rank, and dependency-aware ordering.
//!
//! Every function in this module is a pure function of its inputs — given
//! the same `(tasks, filter, config)` it always returns the same answer, by
//! task id sequence, with a stable sort breaking score ties in input order.

mod dependency;
#[cfg(test)]
mod tests;

pub use dependency::{blocked_task_ids, suggest_order};

use crate::types::{PickableTask, Priority, TaskId, TaskStatus};
use std::collections::HashSet;

/// Priority-to-weight map used by [`score_task`]. Declared as a function
/// rather than a `HashMap` constant so it stays `const`-friendly.
#[must_use]
pub fn priority_weight(priority: Priority) -> f64 {
    match priority {
        Priority::Critical => 5.0,
        Priority::High => 4.0,
        Priority::Medium => 3.0,
        Priority::Low => 2.0,
        Priority::None => 1.0,
    }
}

/// Additive scoring weights. Defaults match the reference weights of the
/// specification exactly.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub priority: f64,
    pub due_date: f64,
    pub age: f64,
    pub simplicity: f64,
    pub label_match_bonus: f64,
    pub complexity_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            priority: 100.0,
            due_date: 50.0,
            age: 10.0,
            simplicity: 5.0,
            label_match_bonus: 20.0,
            complexity_penalty: 15.0,
        }
    }
}

/// Inclusion/exclusion filter applied before scoring.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub labels: Vec<String>,
    pub exclude_labels: Vec<String>,
    pub assignee: Option<String>,
    pub unassigned_only: bool,
    pub max_complexity: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub weights: ScoringWeights,
    pub preferred_labels: Vec<String>,
    pub filter: TaskFilter,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            preferred_labels: Vec::new(),
            filter: TaskFilter::default(),
        }
    }
}

/// Why a task passed or failed the filtering pipeline — kept internal to
/// this module; callers only see the final filtered/ranked lists.
fn passes_filter(task: &PickableTask, filter: &TaskFilter) -> bool {
    if matches!(task.status, TaskStatus::Closed | TaskStatus::WontDo | TaskStatus::Blocked) {
        return false;
    }
    if !filter.labels.is_empty() {
        let overlap = task.labels.iter().any(|l| filter.labels.contains(l));
        if !overlap {
            return false;
        }
    }
    if !filter.exclude_labels.is_empty() {
        let overlap = task.labels.iter().any(|l| filter.exclude_labels.contains(l));
        if overlap {
            return false;
        }
    }
    if let Some(assignee) = &filter.assignee {
        let needle = assignee.trim_start_matches('@').to_lowercase();
        let found = task
            .assignees
            .iter()
            .any(|a| a.trim_start_matches('@').to_lowercase() == needle);
        if !found {
            return false;
        }
    }
    if filter.unassigned_only && !task.assignees.is_empty() {
        return false;
    }
    if let (Some(max), Some(actual)) = (filter.max_complexity, task.estimated_complexity) {
        if actual > max {
            return false;
        }
    }
    true
}

/// Step function over days-until-due. Overdue scores highest; anything
/// further than 14 days out (or with no due date) scores zero.
fn due_date_score(task: &PickableTask, now: chrono::DateTime<chrono::Utc>) -> f64 {
    let Some(due) = task.due_date else {
        return 0.0;
    };
    let days_until = (due - now).num_hours() as f64 / 24.0;
    if days_until < 0.0 {
        5.0
    } else if days_until <= 1.0 {
        4.0
    } else if days_until <= 3.0 {
        3.0
    } else if days_until <= 7.0 {
        2.0
    } else if days_until <= 14.0 {
        1.0
    } else {
        0.0
    }
}

/// The weighted, additive, floor-at-zero score for a single task.
#[must_use]
pub fn score_task(
    task: &PickableTask,
    weights: &ScoringWeights,
    preferred_labels: &[String],
    now: chrono::DateTime<chrono::Utc>,
) -> f64 {
    let priority_score = priority_weight(task.priority) * weights.priority;
    let due_score = due_date_score(task, now) * weights.due_date;
    let age_hours = (now - task.created_at).num_hours().max(0) as f64;
    let age_score = (age_hours / 168.0).min(5.0) * weights.age;
    let simplicity_score = (10i64 - i64::from(task.comment_count)).max(0) as f64 / 10.0 * weights.simplicity;
    let label_overlap = task
        .labels
        .iter()
        .filter(|l| preferred_labels.contains(l))
        .count() as f64;
    let label_bonus = label_overlap * weights.label_match_bonus;
    let complexity_penalty = task
        .estimated_complexity
        .map(|c| (f64::from(c) - 1.0) * weights.complexity_penalty)
        .unwrap_or(0.0);

    (priority_score + due_score + age_score + simplicity_score + label_bonus - complexity_penalty).max(0.0)
}

/// Filter, score and stably sort candidates descending by score.
#[must_use]
pub fn rank_tasks(
    tasks: &[PickableTask],
    config: &PickerConfig,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<(PickableTask, f64)> {
    let blocked = blocked_task_ids(tasks);
    let mut ranked: Vec<(PickableTask, f64)> = tasks
        .iter()
        .filter(|t| passes_filter(t, &config.filter))
        .filter(|t| !blocked.contains(&t.id))
        .map(|t| {
            let score = score_task(t, &config.weights, &config.preferred_labels, now);
            (t.clone(), score)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Outcome of [`pick_next`].
#[derive(Debug, Clone)]
pub struct PickResult {
    pub task: Option<PickableTask>,
    pub score: f64,
    pub reason: String,
    pub considered_count: usize,
    pub blocked_task_ids: HashSet<TaskId>,
}

fn reason_for(task: &PickableTask, score: f64, config: &PickerConfig, now: chrono::DateTime<chrono::Utc>) -> String {
    let due = due_date_score(task, now);
    if due > 0.0 {
        if let Some(d) = task.due_date {
            if d < now {
                return "Overdue task with highest priority".to_string();
            }
        }
        return "Upcoming due date with high priority".to_string();
    }
    if matches!(task.priority, Priority::Critical) {
        return "Critical priority task".to_string();
    }
    if matches!(task.priority, Priority::High) {
        return "High priority task".to_string();
    }
    let matches_preferred = task
        .labels
        .iter()
        .any(|l| config.preferred_labels.contains(l));
    if matches_preferred {
        return "Matches preferred labels".to_string();
    }
    let _ = score;
    "Highest scoring task".to_string()
}

/// Return the next best task, or `None` if nothing survives filtering.
#[must_use]
pub fn pick_next(tasks: &[PickableTask], config: &PickerConfig, now: chrono::DateTime<chrono::Utc>) -> PickResult {
    let blocked = blocked_task_ids(tasks);
    let ranked = rank_tasks(tasks, config, now);
    let considered_count = ranked.len();

    match ranked.first() {
        Some((task, score)) => {
            let reason = reason_for(task, *score, config, now);
            PickResult {
                task: Some(task.clone()),
                score: *score,
                reason,
                considered_count,
                blocked_task_ids: blocked,
            }
        }
        None => PickResult {
            task: None,
            score: 0.0,
            reason: "No tasks available matching criteria".to_string(),
            considered_count: 0,
            blocked_task_ids: blocked,
        },
    }
}

/// Top-N ranked tasks with per-item reasons.
#[must_use]
pub fn pick_top_n(
    tasks: &[PickableTask],
    n: usize,
    config: &PickerConfig,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<(PickableTask, f64, String)> {
    rank_tasks(tasks, config, now)
        .into_iter()
        .take(n)
        .map(|(task, score)| {
            let reason = reason_for(&task, score, config, now);
            (task, score, reason)
        })
        .collect()
}
