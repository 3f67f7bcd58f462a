// file: src/pipeline/orchestrator.rs
// description: runs the pipeline steps in order with per-step retry and backoff
// reference: orchestrates the blocking steps on the tokio blocking pool

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::pipeline::fetcher::{DatasetFetcher, KaggleCliFetcher};
use crate::pipeline::progress::ProgressTracker;
use crate::pipeline::report::{RunReport, StepOutcome};
use crate::pipeline::step::{PipelineStep, StepOutput, execute_step};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct PipelineOrchestrator {
    config: Arc<Config>,
    fetcher: Arc<dyn DatasetFetcher>,
    progress_colored: Option<bool>,
}

impl PipelineOrchestrator {
    /// Uses the command-line retrieval tool named in `config.fetch`.
    pub fn new(config: Config) -> Self {
        let fetcher = Arc::new(KaggleCliFetcher::new(
            &config.fetch,
            config.paths.credentials_dir.clone(),
        ));
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn DatasetFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            progress_colored: None,
        }
    }

    /// Draws a progress bar while `run` executes.
    pub fn with_progress(mut self, colored: bool) -> Self {
        self.progress_colored = Some(colored);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `steps` in order. The first failure stops the run and the
    /// remaining steps are reported as skipped.
    pub async fn run(&self, steps: &[PipelineStep]) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting pipeline for {}", self.config.dataset.slug);

        let progress = match self.progress_colored {
            Some(colored) => ProgressTracker::new(PipelineStep::ALL.len(), colored),
            None => ProgressTracker::hidden(),
        };

        let mut outcomes = Vec::with_capacity(PipelineStep::ALL.len());
        let mut failed = false;

        for step in PipelineStep::ALL {
            if failed || !steps.contains(&step) {
                progress.step_skipped();
                outcomes.push(StepOutcome::skipped(step));
                continue;
            }

            let outcome = self.run_with_retry(step, &progress).await;
            failed = outcome.error.is_some();
            outcomes.push(outcome);
        }

        progress.finish();
        let stats = progress.get_stats();

        let report = RunReport {
            run_id,
            dataset: self.config.dataset.slug.clone(),
            started_at,
            finished_at: Utc::now(),
            steps: outcomes,
            stats,
        };

        if let Some(failed) = report.failed_step() {
            error!(
                %run_id,
                "Pipeline failed at {}: {} ({:.0}% of attempted steps succeeded)",
                failed.task_id,
                failed.error.as_deref().unwrap_or("unknown error"),
                report.stats.success_rate()
            );
        } else {
            info!(
                %run_id,
                "Pipeline finished in {} seconds ({:.0}% of attempted steps succeeded)",
                report.stats.duration_secs,
                report.stats.success_rate()
            );
        }

        report
    }

    async fn run_with_retry(&self, step: PipelineStep, progress: &ProgressTracker) -> StepOutcome {
        let policy = step.retry_policy(&self.config);
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            progress.start_step(step, attempt);
            info!(task = step.task_id(), attempt, "Running step");

            match self.run_step(step).await {
                Ok(output) => {
                    progress.step_succeeded();
                    return StepOutcome::succeeded(step, attempt, elapsed_ms(started), output);
                }
                Err(err) if attempt < policy.attempts.max(1) => {
                    warn!(
                        task = step.task_id(),
                        attempt,
                        "Step failed: {}; retrying in {:?}",
                        err,
                        policy.delay
                    );
                    progress.record_retry();
                    tokio::time::sleep(policy.delay).await;
                }
                Err(err) => {
                    error!(task = step.task_id(), attempt, kind = err.kind(), "{}", err);
                    progress.step_failed();
                    return StepOutcome::failed(step, attempt, elapsed_ms(started), &err);
                }
            }
        }
    }

    /// One attempt at `step`, executed on the blocking pool.
    pub async fn run_step(&self, step: PipelineStep) -> Result<StepOutput> {
        let config = Arc::clone(&self.config);
        let fetcher = Arc::clone(&self.fetcher);

        tokio::task::spawn_blocking(move || execute_step(step, &config, fetcher.as_ref()))
            .await
            .map_err(|e| PipelineError::Task(format!("{} did not complete: {}", step, e)))?
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
