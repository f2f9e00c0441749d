//! `triage pick`: rank available tasks and report the next one to work on.

use triage_core::picker::{pick_next, pick_top_n, PickerConfig};

use crate::adapters::to_pickable_task;
use crate::app::App;
use crate::output::{Output, OutputFormat, PickedTaskView, RankedTaskList, RankedTaskView};

pub struct PickArgs {
    pub labels: Vec<String>,
    pub top: usize,
    pub format: OutputFormat,
}

pub async fn run(app: &App, args: PickArgs) -> anyhow::Result<()> {
    let external = app.adapter.list_tasks(if args.labels.is_empty() { None } else { Some(&args.labels) }).await?;
    let tasks: Vec<_> = external.iter().map(to_pickable_task).collect();
    let config = PickerConfig::default();
    let now = chrono::Utc::now();

    if args.top <= 1 {
        let result = pick_next(&tasks, &config, now);
        tracing::info!(
            considered = result.considered_count,
            picked = result.task.as_ref().map(|t| t.id.to_string()),
            "task picked"
        );
        let view = PickedTaskView {
            task_id: result.task.as_ref().map(|t| t.id.to_string()),
            title: result.task.as_ref().map(|t| t.title.clone()),
            score: result.score,
            reason: result.reason,
            considered_count: result.considered_count,
            blocked_count: result.blocked_task_ids.len(),
        };
        Output::new(args.format).write(&view)?;
    } else {
        let ranked = pick_top_n(&tasks, args.top, &config, now);
        tracing::info!(considered = ranked.len(), "ranked tasks");
        let views = ranked
            .into_iter()
            .map(|(task, score, reason)| RankedTaskView { task_id: task.id.to_string(), title: task.title, score, reason })
            .collect();
        Output::new(args.format).write(&RankedTaskList(views))?;
    }
    Ok(())
}
