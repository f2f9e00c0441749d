//! Dependency-blocking and dependency-respecting ordering.

use crate::types::{PickableTask, TaskId, TaskStatus};
use std::collections::{HashMap, HashSet};

/// A task is blocked iff any of its `depends_on` ids resolves to a task
/// whose status is not resolved (closed/wont_do). A dependency id that does
/// not resolve to any known task is treated as satisfied — it never
/// existed, so it cannot be "unresolved".
#[must_use]
pub fn blocked_task_ids(tasks: &[PickableTask]) -> HashSet<TaskId> {
    let by_id: HashMap<&TaskId, &PickableTask> = tasks.iter().map(|t| (&t.id, t)).collect();
    tasks
        .iter()
        .filter(|task| is_blocked(task, &by_id))
        .map(|task| task.id.clone())
        .collect()
}

fn is_blocked(task: &PickableTask, by_id: &HashMap<&TaskId, &PickableTask>) -> bool {
    let Some(deps) = &task.depends_on else {
        return false;
    };
    deps.iter().any(|dep_id| match by_id.get(dep_id) {
        Some(dep_task) => !dep_task.status.is_resolved(),
        None => false,
    })
}

/// Dependency-respecting linearization of an already filtered, ranked
/// candidate list: for each task in rank order, recursively resolve its
/// dependency chain (unsatisfied deps first, skipping resolved ones) and
/// append in post-order, deduplicating by id. A visited set bounds cycle
/// traversal so cyclic `depends_on` terminates instead of recursing forever.
#[must_use]
pub fn suggest_order(ranked: &[PickableTask]) -> Vec<TaskId> {
    let by_id: HashMap<&TaskId, &PickableTask> = ranked.iter().map(|t| (&t.id, t)).collect();
    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut order: Vec<TaskId> = Vec::with_capacity(ranked.len());

    for task in ranked {
        visit(task, &by_id, &mut visited, &mut order);
    }
    order
}

fn visit<'a>(
    task: &'a PickableTask,
    by_id: &HashMap<&'a TaskId, &'a PickableTask>,
    visited: &mut HashSet<TaskId>,
    order: &mut Vec<TaskId>,
) {
    if visited.contains(&task.id) {
        return;
    }
    visited.insert(task.id.clone());

    if let Some(deps) = &task.depends_on {
        for dep_id in deps {
            if let Some(dep_task) = by_id.get(dep_id) {
                if !dep_task.status.is_resolved() {
                    visit(dep_task, by_id, visited, order);
                }
            }
        }
    }

    order.push(task.id.clone());
}
