//! `triage run`: the end-to-end pipeline — pick a task, spawn variations
//! through the gateway, evaluate each completed result, rank, and apply the
//! auto-accept gate.

use triage_core::evaluator::{SolutionEvaluator, SolutionInput};
use triage_core::picker::{pick_next, PickerConfig};
use triage_core::presentation::build_summary_view;
use triage_core::ranker::{rank_solutions, should_auto_accept, AutoAcceptConfig};
use triage_core::runner::{IterationRunner, RunnerConfig};
use triage_core::types::{
    CompletionCriteria, IterationLimits, IterationPlan, IterationVariation, PlanId, RunnerStrategy, SolutionId, TaskHandle,
    VariationId,
};

use crate::adapters::to_pickable_task;
use crate::app::App;
use crate::comparator::{CliComparatorDeps, CommandMap};
use crate::output::{Output, OutputFormat, RankedSolutionView, RunSummaryView};

pub struct RunArgs {
    pub task_id: Option<String>,
    pub labels: Vec<String>,
    pub variations: usize,
    pub apply: bool,
    pub format: OutputFormat,
}

pub async fn run(app: &App, args: RunArgs) -> anyhow::Result<()> {
    let external = app.adapter.list_tasks(if args.labels.is_empty() { None } else { Some(&args.labels) }).await?;
    let tasks: Vec<_> = external.iter().map(to_pickable_task).collect();

    let picked = match &args.task_id {
        Some(id) => tasks.iter().find(|t| t.id.as_str() == id.as_str()).cloned(),
        None => pick_next(&tasks, &PickerConfig::default(), chrono::Utc::now()).task,
    };
    let Some(task) = picked else {
        anyhow::bail!("no task available to run");
    };
    tracing::info!(task_id = %task.id, "task picked for run");

    let variation_count = args.variations.max(1);
    let variations: Vec<IterationVariation> = (0..variation_count)
        .map(|i| IterationVariation::new(VariationId::from(uuid::Uuid::new_v4().to_string()), format!("variation-{i}"), i as i32))
        .collect();

    let mut plan = IterationPlan::new(
        PlanId::from(uuid::Uuid::new_v4().to_string()),
        TaskHandle { id: task.id.clone(), title: task.title.clone(), description: None },
        RunnerStrategy::Parallel,
        variations,
        IterationLimits { max_concurrent: variation_count, max_total: variation_count, ..IterationLimits::default() },
        CompletionCriteria { wait_for_all: true, ..CompletionCriteria::default() },
    );

    let runner = IterationRunner::new(app.new_gateway(), RunnerConfig { poll_interval: std::time::Duration::from_millis(50), ..RunnerConfig::default() });
    let started = std::time::Instant::now();
    let _aggregate = runner.execute(&mut plan).await;
    let evaluation_duration_ms = started.elapsed().as_millis() as i64;

    for variation in &plan.variations {
        tracing::info!(variation_id = %variation.id, status = ?variation.status, "variation completed");
    }

    let deps = CliComparatorDeps { commands: CommandMap::from(app.config.commands.clone()), working_dir: std::env::current_dir()? };
    let weights = app.config.evaluator_weights.into();
    let evaluator = SolutionEvaluator::new(&deps, weights)?;

    let evaluations: Vec<_> = plan
        .variations
        .iter()
        .filter_map(|v| v.result.as_ref())
        .filter(|r| r.success)
        .map(|result| {
            let solution = SolutionInput {
                solution_id: SolutionId::from(result.variation_id.as_str()),
                iteration_id: result.variation_id.to_string(),
                task_description: task.title.clone(),
                original_code: None,
                solution_code: result.output.clone(),
                changed_files: Vec::new(),
            };
            let evaluation = evaluator.evaluate(&solution);
            tracing::info!(solution_id = %evaluation.solution_id, score = evaluation.overall_score, "evaluation scored");
            evaluation
        })
        .collect();

    let ranking = rank_solutions(evaluations);
    let auto_accept_config: AutoAcceptConfig = app.config.auto_accept.into();
    let decision = should_auto_accept(&ranking, &auto_accept_config);
    tracing::info!(accept = decision.accept, reason = %decision.reason, "auto-accept decision");

    let summary = build_summary_view(&ranking, task.id.to_string(), task.title.clone(), decision.accept, evaluation_duration_ms);

    if decision.accept && args.apply {
        if let Some(winner) = &summary.winner {
            app.adapter.update_status(task.id.as_str(), "closed").await?;
            app.adapter.add_comment(task.id.as_str(), &format!("Auto-accepted solution {winner}")).await?;
        }
    }

    let view = RunSummaryView {
        task_id: summary.task_id,
        task_title: summary.task_title,
        winner: summary.winner.map(|id| id.to_string()),
        auto_accepted: summary.auto_acceptance,
        auto_accept_reason: decision.reason,
        evaluation_duration_ms: summary.evaluation_duration_ms,
        solutions: summary
            .iterations
            .into_iter()
            .map(|s| RankedSolutionView {
                rank: s.rank,
                solution_id: s.solution_id.to_string(),
                overall_score: s.evaluation.overall_score,
                confidence: s.evaluation.confidence,
                strengths: s.strengths,
                weaknesses: s.weaknesses,
            })
            .collect(),
    };
    Output::new(args.format).write(&view)?;
    Ok(())
}
