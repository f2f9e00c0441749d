//! In-memory `TaskSourceAdapter` — backs tests and the mock pipeline. Always
//! configured; nothing to set up.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ExternalTask, TaskSourceAdapter};

pub struct InMemoryAdapter {
    tasks: Mutex<Vec<ExternalTask>>,
    comments: Mutex<std::collections::HashMap<String, Vec<String>>>,
}

impl InMemoryAdapter {
    #[must_use]
    pub fn new(tasks: Vec<ExternalTask>) -> Self {
        Self { tasks: Mutex::new(tasks), comments: Mutex::new(std::collections::HashMap::new()) }
    }
}

#[async_trait]
impl TaskSourceAdapter for InMemoryAdapter {
    async fn list_tasks(&self, labels: Option<&[String]>) -> anyhow::Result<Vec<ExternalTask>> {
        let tasks = self.tasks.lock().await;
        Ok(match labels {
            Some(labels) => tasks.iter().filter(|t| t.labels.iter().any(|l| labels.contains(l))).cloned().collect(),
            None => tasks.clone(),
        })
    }

    async fn get_task(&self, id: &str) -> anyhow::Result<Option<ExternalTask>> {
        let tasks = self.tasks.lock().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn update_status(&self, id: &str, new_status: &str) -> anyhow::Result<()> {
        let mut tasks = self.tasks.lock().await;
        match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = new_status.to_string();
                Ok(())
            }
            None => anyhow::bail!("no task with id {id}"),
        }
    }

    async fn add_comment(&self, id: &str, body: &str) -> anyhow::Result<()> {
        let mut comments = self.comments.lock().await;
        comments.entry(id.to_string()).or_default().push(body.to_string());
        Ok(())
    }

    async fn get_comments(&self, id: &str) -> anyhow::Result<Vec<String>> {
        let comments = self.comments.lock().await;
        Ok(comments.get(id).cloned().unwrap_or_default())
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn get_config_instructions(&self) -> String {
        "The in-memory adapter needs no configuration.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, labels: &[&str]) -> ExternalTask {
        ExternalTask {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            status: "open".to_string(),
            priority: "medium".to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            assignees: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            due_date: None,
            comment_count: 0,
            depends_on: Vec::new(),
            estimated_complexity: None,
        }
    }

    #[tokio::test]
    async fn list_tasks_filters_by_label() {
        let adapter = InMemoryAdapter::new(vec![task("t1", &["backend"]), task("t2", &["frontend"])]);
        let found = adapter.list_tasks(Some(&["backend".to_string()])).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "t1");
    }

    #[tokio::test]
    async fn update_status_then_get_task_reflects_change() {
        let adapter = InMemoryAdapter::new(vec![task("t1", &[])]);
        adapter.update_status("t1", "closed").await.unwrap();
        let fetched = adapter.get_task("t1").await.unwrap().unwrap();
        assert_eq!(fetched.status, "closed");
    }

    #[tokio::test]
    async fn comments_accumulate_per_task() {
        let adapter = InMemoryAdapter::new(vec![task("t1", &[])]);
        adapter.add_comment("t1", "first").await.unwrap();
        adapter.add_comment("t1", "second").await.unwrap();
        let comments = adapter.get_comments("t1").await.unwrap();
        assert_eq!(comments, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn updating_unknown_task_is_an_error() {
        let adapter = InMemoryAdapter::new(vec![]);
        assert!(adapter.update_status("missing", "closed").await.is_err());
    }
}
