use super::*;
use crate::types::Priority;
use chrono::{Duration, Utc};
use std::collections::HashSet as Set;

fn base_task(id: &str, priority: Priority) -> PickableTask {
    PickableTask {
        id: TaskId::from(id),
        title: id.to_string(),
        status: TaskStatus::Open,
        priority,
        labels: vec![],
        assignees: Set::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        due_date: None,
        comment_count: 0,
        depends_on: None,
        estimated_complexity: None,
    }
}

#[test]
fn s1_picker_critical_wins() {
    let tasks = vec![
        base_task("low", Priority::Low),
        base_task("high", Priority::High),
        base_task("crit", Priority::Critical),
        base_task("med", Priority::Medium),
    ];
    let config = PickerConfig::default();
    let result = pick_next(&tasks, &config, Utc::now());
    assert_eq!(result.task.unwrap().id, TaskId::from("crit"));
    assert!(result.reason.contains("Critical"));
}

#[test]
fn s2_overdue_beats_higher_priority() {
    let now = chrono::DateTime::parse_from_rfc3339("2024-06-15T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let mut overdue = base_task("od", Priority::Medium);
    overdue.due_date = Some(
        chrono::DateTime::parse_from_rfc3339("2024-06-14T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
    );
    let mut future = base_task("fut", Priority::High);
    future.due_date = Some(
        chrono::DateTime::parse_from_rfc3339("2024-06-22T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
    );
    let tasks = vec![overdue, future];
    let config = PickerConfig::default();
    let result = pick_next(&tasks, &config, now);
    assert_eq!(result.task.unwrap().id, TaskId::from("od"));
    assert!(result.reason.contains("Overdue"));
}

#[test]
fn score_never_negative() {
    let mut heavy = base_task("heavy", Priority::None);
    heavy.comment_count = 1000;
    heavy.estimated_complexity = Some(10);
    let weights = ScoringWeights::default();
    let score = score_task(&heavy, &weights, &[], Utc::now());
    assert!(score >= 0.0);
}

#[test]
fn empty_pool_reason() {
    let config = PickerConfig::default();
    let result = pick_next(&[], &config, Utc::now());
    assert!(result.task.is_none());
    assert_eq!(result.considered_count, 0);
    assert_eq!(result.reason, "No tasks available matching criteria");
}

#[test]
fn closed_and_blocked_statuses_excluded() {
    let tasks = vec![
        {
            let mut t = base_task("closed", Priority::Critical);
            t.status = TaskStatus::Closed;
            t
        },
        {
            let mut t = base_task("blocked", Priority::Critical);
            t.status = TaskStatus::Blocked;
            t
        },
        base_task("open", Priority::Low),
    ];
    let config = PickerConfig::default();
    let result = pick_next(&tasks, &config, Utc::now());
    assert_eq!(result.task.unwrap().id, TaskId::from("open"));
}

#[test]
fn label_filter_requires_overlap() {
    let mut labeled = base_task("labeled", Priority::Low);
    labeled.labels = vec!["backend".to_string()];
    let unlabeled = base_task("plain", Priority::Critical);
    let tasks = vec![labeled, unlabeled];
    let mut config = PickerConfig::default();
    config.filter.labels = vec!["backend".to_string()];
    let result = pick_next(&tasks, &config, Utc::now());
    assert_eq!(result.task.unwrap().id, TaskId::from("labeled"));
}

#[test]
fn assignee_filter_strips_at_and_ignores_case() {
    let mut assigned = base_task("assigned", Priority::Low);
    assigned.assignees.insert("Alice".to_string());
    let tasks = vec![assigned];
    let mut config = PickerConfig::default();
    config.filter.assignee = Some("@alice".to_string());
    let result = pick_next(&tasks, &config, Utc::now());
    assert!(result.task.is_some());
}

#[test]
fn stable_tie_break_preserves_input_order() {
    let tasks = vec![base_task("first", Priority::Medium), base_task("second", Priority::Medium)];
    let config = PickerConfig::default();
    let top = pick_top_n(&tasks, 2, &config, Utc::now());
    assert_eq!(top[0].0.id, TaskId::from("first"));
    assert_eq!(top[1].0.id, TaskId::from("second"));
}

#[test]
fn suggest_order_is_topological_for_independent_chains() {
    let mut a = base_task("a", Priority::Low);
    a.depends_on = Some([TaskId::from("b")].into_iter().collect());
    let b = base_task("b", Priority::Low);
    let mut c = base_task("c", Priority::Critical);
    c.depends_on = Some([TaskId::from("d")].into_iter().collect());
    let d = base_task("d", Priority::Low);

    let ranked: Vec<PickableTask> = rank_tasks(&[a, b, c, d], &PickerConfig::default(), Utc::now())
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    let order = suggest_order(&ranked);
    let idx = |id: &str| order.iter().position(|x| x.as_str() == id).unwrap();
    assert!(idx("d") < idx("c"));
    assert!(idx("b") < idx("a"));
}

#[test]
fn age_contributes_positively_and_is_capped() {
    let mut old = base_task("old", Priority::None);
    old.created_at = Utc::now() - Duration::days(60);
    let weights = ScoringWeights::default();
    let score_old = score_task(&old, &weights, &[], Utc::now());
    let score_new = score_task(&base_task("new", Priority::None), &weights, &[], Utc::now());
    assert!(score_old > score_new);
}
