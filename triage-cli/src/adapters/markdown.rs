//! Markdown-file `TaskSourceAdapter`: reads a directory of files, each
//! containing one or more `### Task: <id> - <title>` sections, into
//! [`ExternalTask`] records. Modeled on the teacher's layered config loader
//! style for turning a human-edited text file into a typed value: read,
//! split into fields, tolerate missing optional fields, fail loudly on a
//! malformed required one.
//!
//! Section format:
//!
//! ```text
//! ### Task: t1 - Fix the login race
//! - status: in_progress
//! - priority: high
//! - labels: backend, urgent
//! - assignees: alice
//! - due: 2026-08-01T00:00:00Z
//! - complexity: 3
//! - depends_on: t0
//!
//! Free-text description, optional.
//!
//! #### Comments
//! - first comment
//! - second comment
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ExternalTask, TaskSourceAdapter};

pub struct MarkdownAdapter {
    dir: PathBuf,
}

impl MarkdownAdapter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_all(&self) -> anyhow::Result<Vec<ExternalTask>> {
        let mut tasks = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let content = tokio::fs::read_to_string(&path).await?;
            tasks.extend(parse_sections(&content));
        }
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }

    /// Locate the file containing the `### Task: <id> ...` section for
    /// `id`, scanning every `.md` file in the directory since sections are
    /// not required to live one-per-file.
    async fn find_file_for(&self, id: &str) -> anyhow::Result<Option<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let content = tokio::fs::read_to_string(&path).await?;
            let contains_id = content.lines().any(|line| {
                line.strip_prefix("### Task: ")
                    .map(|header| header == id || header.starts_with(&format!("{id} - ")))
                    .unwrap_or(false)
            });
            if contains_id {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

/// Line range `[start, end)` of the `id` section's body (after its header,
/// up to but excluding the next `### Task:` header or end of file).
fn section_bounds(content: &str, id: &str) -> (usize, usize) {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines
        .iter()
        .position(|line| {
            line.strip_prefix("### Task: ")
                .map(|header| header == id || header.starts_with(&format!("{id} - ")))
                .unwrap_or(false)
        })
        .map_or(lines.len(), |i| i + 1);
    let end = lines[start..]
        .iter()
        .position(|line| line.starts_with("### Task: "))
        .map_or(lines.len(), |offset| start + offset);
    (start, end)
}

fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let prefix = format!("- {key}:");
    line.trim().strip_prefix(&prefix).map(str::trim)
}

fn parse_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Parse every `### Task: ...` section in `content` into an [`ExternalTask`].
/// Unknown or malformed field lines are ignored rather than rejected, since
/// these files are hand-edited.
fn parse_sections(content: &str) -> Vec<ExternalTask> {
    let mut tasks = Vec::new();
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let Some(header) = lines[i].strip_prefix("### Task: ") else {
            i += 1;
            continue;
        };
        let (id, title) = match header.split_once(" - ") {
            Some((id, title)) => (id.trim().to_string(), title.trim().to_string()),
            None => (header.trim().to_string(), header.trim().to_string()),
        };
        i += 1;

        let mut status = "open".to_string();
        let mut priority = "none".to_string();
        let mut labels = Vec::new();
        let mut assignees = Vec::new();
        let mut due_date = None;
        let mut estimated_complexity = None;
        let mut depends_on = Vec::new();
        let mut description_lines = Vec::new();
        let mut comments = Vec::new();
        let mut in_comments = false;

        while i < lines.len() && !lines[i].starts_with("### Task: ") {
            let line = lines[i];
            if line.trim() == "#### Comments" {
                in_comments = true;
                i += 1;
                continue;
            }
            if in_comments {
                if let Some(comment) = line.trim().strip_prefix("- ") {
                    comments.push(comment.to_string());
                }
            } else if let Some(value) = field_value(line, "status") {
                status = value.to_string();
            } else if let Some(value) = field_value(line, "priority") {
                priority = value.to_string();
            } else if let Some(value) = field_value(line, "labels") {
                labels = parse_list(value);
            } else if let Some(value) = field_value(line, "assignees") {
                assignees = parse_list(value);
            } else if let Some(value) = field_value(line, "due") {
                due_date = DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.with_timezone(&Utc));
            } else if let Some(value) = field_value(line, "complexity") {
                estimated_complexity = value.parse().ok();
            } else if let Some(value) = field_value(line, "depends_on") {
                depends_on = parse_list(value);
            } else if !line.trim().is_empty() && !line.trim().starts_with('-') {
                description_lines.push(line);
            }
            i += 1;
        }

        let description = description_lines.join("\n").trim().to_string();
        tasks.push(ExternalTask {
            id,
            title,
            description: if description.is_empty() { None } else { Some(description) },
            status,
            priority,
            labels,
            assignees,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            due_date,
            comment_count: comments.len() as u32,
            depends_on,
            estimated_complexity,
        });
    }
    tasks
}

#[async_trait]
impl TaskSourceAdapter for MarkdownAdapter {
    async fn list_tasks(&self, labels: Option<&[String]>) -> anyhow::Result<Vec<ExternalTask>> {
        let tasks = self.read_all().await?;
        Ok(match labels {
            Some(labels) => tasks.into_iter().filter(|t| t.labels.iter().any(|l| labels.contains(l))).collect(),
            None => tasks,
        })
    }

    async fn get_task(&self, id: &str) -> anyhow::Result<Option<ExternalTask>> {
        Ok(self.read_all().await?.into_iter().find(|t| t.id == id))
    }

    async fn update_status(&self, id: &str, new_status: &str) -> anyhow::Result<()> {
        let Some(path) = self.find_file_for(id).await? else {
            anyhow::bail!("no task with id {id} under {}", self.dir.display());
        };
        let content = tokio::fs::read_to_string(&path).await?;
        let (start, end) = section_bounds(&content, id);
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        for line in &mut lines[start..end] {
            if field_value(line, "status").is_some() {
                *line = format!("- status: {new_status}");
            }
        }
        tokio::fs::write(&path, lines.join("\n")).await?;
        Ok(())
    }

    async fn add_comment(&self, id: &str, body: &str) -> anyhow::Result<()> {
        let Some(path) = self.find_file_for(id).await? else {
            anyhow::bail!("no task with id {id} under {}", self.dir.display());
        };
        let content = tokio::fs::read_to_string(&path).await?;
        let (start, end) = section_bounds(&content, id);
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        let has_comments_header = lines[start..end].iter().any(|l| l.trim() == "#### Comments");
        let insert_at = end;
        if has_comments_header {
            lines.insert(insert_at, format!("- {body}"));
        } else {
            lines.insert(insert_at, "#### Comments".to_string());
            lines.insert(insert_at + 1, format!("- {body}"));
        }
        tokio::fs::write(&path, lines.join("\n")).await?;
        Ok(())
    }

    async fn get_comments(&self, id: &str) -> anyhow::Result<Vec<String>> {
        let Some(path) = self.find_file_for(id).await? else {
            return Ok(Vec::new());
        };
        let content = tokio::fs::read_to_string(&path).await?;
        let (start, end) = section_bounds(&content, id);
        let lines: Vec<&str> = content.lines().collect();
        Ok(extract_comments(&lines[start..end].join("\n")))
    }

    fn is_configured(&self) -> bool {
        self.dir.exists() && self.dir.is_dir()
    }

    fn get_config_instructions(&self) -> String {
        format!(
            "Create the directory {} and add one or more .md files, each with one or more '### Task: <id> - <title>' sections.",
            self.dir.display()
        )
    }
}

fn extract_comments(content: &str) -> Vec<String> {
    let mut comments = Vec::new();
    let mut in_comments = false;
    for line in content.lines() {
        if line.trim() == "#### Comments" {
            in_comments = true;
            continue;
        }
        if in_comments {
            if let Some(comment) = line.trim().strip_prefix("- ") {
                comments.push(comment.to_string());
            }
        }
    }
    comments
}
