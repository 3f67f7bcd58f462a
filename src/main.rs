// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use companies_ingest::utils::logging::{format_error, format_step, format_success};
use companies_ingest::{Config, PipelineOrchestrator, PipelineStep, RunReport, StepStatus};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "companies_ingest")]
#[command(version)]
#[command(about = "Download the companies dataset and produce a cleaned CSV sample", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root directory for the archive and CSV files
    #[arg(long, value_name = "DIR", env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory holding the retrieval tool's credentials
    #[arg(long, value_name = "DIR", env = "KAGGLE_CONFIG_DIR")]
    credentials_dir: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every step in order, retrying the download once
    Run {
        /// Reuse the archive already in the data directory
        #[arg(long)]
        skip_fetch: bool,

        /// Write a JSON summary of the run
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Run a single step once: prepare-directories, fetch-dataset, extract-archive or clean-sample
    Step {
        #[arg(value_parser = PipelineStep::from_str)]
        task: PipelineStep,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli(None, std::env::args_os()).unwrap_or_else(|e| e.exit());

    companies_ingest::utils::logging::init_logger(cli.color, cli.verbose);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(cli.data_dir, cli.credentials_dir);

    match cli.command {
        Commands::Run { skip_fetch, report } => {
            cmd_run(config, cli.color, skip_fetch, report).await?;
        }
        Commands::Step { task } => {
            cmd_step(config, task).await?;
        }
        Commands::Config => {
            cmd_config(&config)?;
        }
    }

    Ok(())
}

/// Loads `.env` (or `env_file`) before clap resolves the `env`-backed flags.
fn parse_cli<I, T>(env_file: Option<&Path>, args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    if let Some(path) = env_file {
        dotenvy::from_path(path).ok();
    } else {
        dotenvy::dotenv().ok();
    }
    Cli::try_parse_from(args)
}

async fn cmd_run(
    config: Config,
    color: bool,
    skip_fetch: bool,
    report_path: Option<PathBuf>,
) -> Result<()> {
    info!("Data directory: {}", config.paths.data_dir.display());

    let steps: Vec<PipelineStep> = PipelineStep::ALL
        .into_iter()
        .filter(|step| !(skip_fetch && *step == PipelineStep::FetchDataset))
        .collect();

    if skip_fetch {
        warn!("Skipping download, using {}", config.archive_path().display());
    }

    let orchestrator = PipelineOrchestrator::new(config).with_progress(color);
    let report = orchestrator.run(&steps).await;

    print_summary(&report);

    if let Some(path) = report_path {
        report
            .write_json(&path)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;
        info!("Run report written to {}", path.display());
    }

    if let Some(failed) = report.failed_step() {
        anyhow::bail!(
            "Step {} failed: {}",
            failed.task_id,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!(
        "{}",
        format_success(&format!(
            "Clean sample written to {}",
            orchestrator.config().clean_csv_path().display()
        ))
    );
    Ok(())
}

async fn cmd_step(config: Config, task: PipelineStep) -> Result<()> {
    info!("Running {}", task);

    let orchestrator = PipelineOrchestrator::new(config);
    let output = orchestrator
        .run_step(task)
        .await
        .with_context(|| format!("Step {} failed", task))?;

    println!("{}", format_success(task.task_id()));
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let total = report.steps.len();

    for (index, outcome) in report.steps.iter().enumerate() {
        let line = match outcome.status {
            StepStatus::Succeeded => format_success(&format!(
                "{} ({} ms, {} attempt{})",
                outcome.task_id,
                outcome.duration_ms,
                outcome.attempts,
                if outcome.attempts == 1 { "" } else { "s" }
            )),
            StepStatus::Failed => format_error(&format!(
                "{} [{}] {}",
                outcome.task_id,
                outcome.error_kind.as_deref().unwrap_or("Error"),
                outcome.error.as_deref().unwrap_or("")
            )),
            StepStatus::Skipped => format!("  {} skipped", outcome.task_id),
        };
        println!("{}", format_step(index + 1, total, &line));
    }

    println!(
        "  {} retries, {:.0}% of attempted steps succeeded",
        report.stats.retries,
        report.stats.success_rate()
    );
}
