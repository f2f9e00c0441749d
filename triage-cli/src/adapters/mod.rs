//! `TaskSourceAdapter`: the external contract the driver consumes to pull
//! tasks from wherever they actually live. `triage-core` never sees this
//! trait — it only ever sees the `PickableTask`s the driver maps from an
//! `ExternalTask` field by field, per the external-interfaces contract.

pub mod markdown;
pub mod memory;

pub use markdown::MarkdownAdapter;
pub use memory::InMemoryAdapter;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use triage_core::types::{PickableTask, Priority, TaskId, TaskStatus};

/// A task as pulled in from an external source, before it is mapped to a
/// [`PickableTask`]. Plain strings rather than `triage-core` enums since the
/// adapter boundary has no reason to depend on the core crate's types.
#[derive(Debug, Clone)]
pub struct ExternalTask {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub comment_count: u32,
    pub depends_on: Vec<String>,
    pub estimated_complexity: Option<u8>,
}

#[async_trait]
pub trait TaskSourceAdapter: Send + Sync {
    async fn list_tasks(&self, labels: Option<&[String]>) -> anyhow::Result<Vec<ExternalTask>>;
    async fn get_task(&self, id: &str) -> anyhow::Result<Option<ExternalTask>>;
    async fn update_status(&self, id: &str, new_status: &str) -> anyhow::Result<()>;
    async fn add_comment(&self, id: &str, body: &str) -> anyhow::Result<()>;
    async fn get_comments(&self, id: &str) -> anyhow::Result<Vec<String>>;
    fn is_configured(&self) -> bool;
    fn get_config_instructions(&self) -> String;
}

fn parse_status(raw: &str) -> TaskStatus {
    match raw.to_lowercase().as_str() {
        "in_progress" | "in-progress" => TaskStatus::InProgress,
        "blocked" => TaskStatus::Blocked,
        "review" => TaskStatus::Review,
        "closed" | "done" => TaskStatus::Closed,
        "wont_do" | "wont-do" | "wontfix" => TaskStatus::WontDo,
        _ => TaskStatus::Open,
    }
}

fn parse_priority(raw: &str) -> Priority {
    match raw.to_lowercase().as_str() {
        "critical" => Priority::Critical,
        "high" => Priority::High,
        "medium" => Priority::Medium,
        "low" => Priority::Low,
        _ => Priority::None,
    }
}

/// Map an [`ExternalTask`] field-by-field onto a [`PickableTask`], per the
/// external-interfaces contract ("an ExternalTask is mapped field-by-field
/// to PickableTask by the driver").
#[must_use]
pub fn to_pickable_task(task: &ExternalTask) -> PickableTask {
    PickableTask {
        id: TaskId::from(task.id.as_str()),
        title: task.title.clone(),
        status: parse_status(&task.status),
        priority: parse_priority(&task.priority),
        labels: task.labels.clone(),
        assignees: task.assignees.iter().cloned().collect::<HashSet<_>>(),
        created_at: task.created_at,
        updated_at: task.updated_at,
        due_date: task.due_date,
        comment_count: task.comment_count,
        depends_on: if task.depends_on.is_empty() {
            None
        } else {
            Some(task.depends_on.iter().map(|id| TaskId::from(id.as_str())).collect())
        },
        estimated_complexity: task.estimated_complexity,
    }
}
