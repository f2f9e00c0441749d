//! Terminal output: a `--format human|json` switch plus the plain view
//! structs each command renders through. Trimmed from the teacher's
//! `Output`/`OutputFormat` pair — no YAML variant, since the workspace
//! carries no `serde_yaml`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// A value a command can hand to [`Output::write`]: JSON via `Serialize`,
/// plain text via `render_human`.
pub trait Renderable: Serialize {
    fn render_human(&self) -> String;
}

pub struct Output {
    format: OutputFormat,
}

impl Output {
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn write<T: Renderable>(&self, value: &T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("{}", value.render_human());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PickedTaskView {
    pub task_id: Option<String>,
    pub title: Option<String>,
    pub score: f64,
    pub reason: String,
    pub considered_count: usize,
    pub blocked_count: usize,
}

impl Renderable for PickedTaskView {
    fn render_human(&self) -> String {
        match &self.task_id {
            Some(id) => format!(
                "Picked {id} — {title}\n  score: {score:.1}\n  reason: {reason}\n  considered: {considered}, blocked: {blocked}",
                id = id,
                title = self.title.as_deref().unwrap_or(""),
                score = self.score,
                reason = self.reason,
                considered = self.considered_count,
                blocked = self.blocked_count,
            ),
            None => format!("No task available — {}", self.reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedTaskView {
    pub task_id: String,
    pub title: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedTaskList(pub Vec<RankedTaskView>);

impl Renderable for RankedTaskList {
    fn render_human(&self) -> String {
        if self.0.is_empty() {
            return "No tasks available matching criteria".to_string();
        }
        self.0
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{:>2}. {} ({:.1}) — {} — {}", i + 1, t.task_id, t.score, t.title, t.reason))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedSolutionView {
    pub rank: usize,
    pub solution_id: String,
    pub overall_score: f64,
    pub confidence: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryView {
    pub task_id: String,
    pub task_title: String,
    pub winner: Option<String>,
    pub auto_accepted: bool,
    pub auto_accept_reason: String,
    pub evaluation_duration_ms: i64,
    pub solutions: Vec<RankedSolutionView>,
}

impl Renderable for RunSummaryView {
    fn render_human(&self) -> String {
        let mut lines = vec![format!("Task {} — {}", self.task_id, self.task_title)];
        for solution in &self.solutions {
            lines.push(format!(
                "  #{} {} — score {:.2}, confidence {:.2}",
                solution.rank, solution.solution_id, solution.overall_score, solution.confidence
            ));
            for strength in &solution.strengths {
                lines.push(format!("      + {strength}"));
            }
            for weakness in &solution.weaknesses {
                lines.push(format!("      - {weakness}"));
            }
        }
        match &self.winner {
            Some(id) if self.auto_accepted => lines.push(format!("Winner {id} auto-accepted: {}", self.auto_accept_reason)),
            Some(id) => lines.push(format!("Winner {id}, manual review required: {}", self.auto_accept_reason)),
            None => lines.push(format!("No winner selected: {}", self.auto_accept_reason)),
        }
        lines.push(format!("Evaluation took {}ms", self.evaluation_duration_ms));
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternView {
    pub id: String,
    pub pattern_type: String,
    pub description: String,
    pub confidence: f64,
    pub observation_count: u32,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternList(pub Vec<PatternView>);

impl Renderable for PatternList {
    fn render_human(&self) -> String {
        if self.0.is_empty() {
            return "No patterns recorded".to_string();
        }
        self.0
            .iter()
            .map(|p| {
                format!(
                    "{} [{}] confidence {:.2} ({} obs{}) — {}",
                    p.id,
                    p.pattern_type,
                    p.confidence,
                    p.observation_count,
                    if p.active { ", active" } else { "" },
                    p.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantMetricView {
    pub variant_id: String,
    pub exposures: u64,
    pub success_rate: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentStatusView {
    pub experiment_id: String,
    pub total_exposures: u64,
    pub winning_variant: Option<String>,
    pub variants: Vec<VariantMetricView>,
}

impl Renderable for ExperimentStatusView {
    fn render_human(&self) -> String {
        let mut lines = vec![format!("Experiment {} ({} exposures)", self.experiment_id, self.total_exposures)];
        for variant in &self.variants {
            lines.push(format!(
                "  {} — success rate {:.2}, confidence {:.2} ({} exposures)",
                variant.variant_id, variant.success_rate, variant.confidence, variant.exposures
            ));
        }
        match &self.winning_variant {
            Some(id) => lines.push(format!("Winner: {id}")),
            None => lines.push("No winner yet".to_string()),
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigView(pub crate::config::Config);

impl Renderable for ConfigView {
    fn render_human(&self) -> String {
        toml::to_string_pretty(&self.0).unwrap_or_else(|err| format!("<failed to render config: {err}>"))
    }
}
