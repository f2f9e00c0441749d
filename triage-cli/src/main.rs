use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod adapters;
mod app;
mod commands;
mod comparator;
mod config;
mod gateway;
mod output;

use app::App;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Task triage and solution pipeline driver")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,

    /// Agent id the pattern store and A/B experiment state are scoped to
    #[arg(long)]
    agent_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank available tasks and report the next one (or top N) to work on
    Pick {
        /// Only consider tasks carrying one of these labels
        #[arg(long)]
        label: Vec<String>,
        /// Report the top N ranked tasks instead of just the next one
        #[arg(long, default_value_t = 1)]
        top: usize,
    },
    /// Run the full pipeline: pick, spawn variations, evaluate, rank, accept
    Run {
        /// Work this specific task id instead of picking one
        #[arg(long)]
        task: Option<String>,
        /// Only consider tasks carrying one of these labels when picking
        #[arg(long)]
        label: Vec<String>,
        /// Number of variations to spawn
        #[arg(long, default_value_t = 3)]
        variations: usize,
        /// Update the task source and add a comment if the winner is auto-accepted
        #[arg(long)]
        apply: bool,
    },
    /// Pattern store operations
    Pattern {
        #[command(subcommand)]
        command: PatternCommands,
    },
    /// A/B experiment operations
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommands,
    },
    /// Configuration operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum PatternCommands {
    /// List recorded patterns
    List {
        #[arg(long)]
        active_only: bool,
    },
    /// Record a time-of-day observation
    Observe {
        /// Free-text description of the observed action
        action: String,
    },
    /// Run a batch detection pass over recent observations
    Detect {
        #[arg(long, default_value_t = 50)]
        max_patterns: usize,
    },
}

#[derive(Subcommand)]
enum ExperimentCommands {
    /// Assign a session to a variant
    Assign { experiment_id: String, session_key: String },
    /// Record an exposure outcome for a variant
    Record { experiment_id: String, variant_id: String, #[arg(long)] success: bool },
    /// Show metrics and graduation status
    Status { experiment_id: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the fully resolved, validated configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
    } else {
        tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
    }

    let mut cfg = config::load_and_validate(cli.config.as_deref())?;
    if let Some(agent_id) = &cli.agent_id {
        cfg.agent_id = agent_id.clone();
    }
    config::validate_config(&cfg)?;

    let app = App::new(cfg);

    match cli.command {
        Commands::Pick { label, top } => commands::pick::run(&app, commands::pick::PickArgs { labels: label, top, format: cli.format }).await,
        Commands::Run { task, label, variations, apply } => {
            commands::run::run(&app, commands::run::RunArgs { task_id: task, labels: label, variations, apply, format: cli.format }).await
        }
        Commands::Pattern { command } => match command {
            PatternCommands::List { active_only } => commands::pattern::list(&app, active_only, cli.format).await,
            PatternCommands::Observe { action } => commands::pattern::observe(&app, action).await,
            PatternCommands::Detect { max_patterns } => commands::pattern::detect(&app, max_patterns, cli.format).await,
        },
        Commands::Experiment { command } => match command {
            ExperimentCommands::Assign { experiment_id, session_key } => commands::experiment::assign(&app, experiment_id, session_key).await,
            ExperimentCommands::Record { experiment_id, variant_id, success } => {
                commands::experiment::record(&app, experiment_id, variant_id, success).await
            }
            ExperimentCommands::Status { experiment_id } => commands::experiment::status(&app, experiment_id, cli.format).await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show(&app, cli.format),
        },
    }
}
