// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for pipeline execution
// reference: uses indicatif for progress bars and tracks step outcomes

use crate::pipeline::step::PipelineStep;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PipelineStats {
    pub steps_succeeded: usize,
    pub steps_failed: usize,
    pub steps_skipped: usize,
    pub retries: usize,
    pub duration_secs: u64,
}

impl PipelineStats {
    /// Share of attempted steps that succeeded, in percent; skipped steps are not counted.
    pub fn success_rate(&self) -> f64 {
        let total = self.steps_succeeded + self.steps_failed;
        if total == 0 {
            return 0.0;
        }
        (self.steps_succeeded as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    bar: ProgressBar,
    steps_succeeded: AtomicUsize,
    steps_failed: AtomicUsize,
    steps_skipped: AtomicUsize,
    retries: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_steps: usize, colored: bool) -> Self {
        Self::with_bar(create_progress_bar(total_steps as u64, colored))
    }

    /// Tracks counters without drawing anything.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            steps_succeeded: AtomicUsize::new(0),
            steps_failed: AtomicUsize::new(0),
            steps_skipped: AtomicUsize::new(0),
            retries: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn start_step(&self, step: PipelineStep, attempt: u32) {
        if attempt > 1 {
            self.bar
                .set_message(format!("{} (attempt {})", step.task_id(), attempt));
        } else {
            self.bar.set_message(step.task_id().to_string());
        }
    }

    pub fn step_succeeded(&self) {
        self.steps_succeeded.fetch_add(1, Ordering::SeqCst);
        self.bar.inc(1);
    }

    pub fn step_failed(&self) {
        self.steps_failed.fetch_add(1, Ordering::SeqCst);
        self.bar.inc(1);
    }

    pub fn step_skipped(&self) {
        self.steps_skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.inc(1);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn finish(&self) {
        if self.steps_failed.load(Ordering::SeqCst) > 0 {
            self.bar.abandon_with_message("Pipeline failed");
        } else {
            self.bar.finish_with_message("Pipeline complete");
        }
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            steps_succeeded: self.steps_succeeded.load(Ordering::SeqCst),
            steps_failed: self.steps_failed.load(Ordering::SeqCst),
            steps_skipped: self.steps_skipped.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

fn create_progress_bar(total: u64, colored: bool) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let template = if colored {
        "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}"
    } else {
        "{spinner} [{elapsed_precise}] [{bar:30}] {pos}/{len} {msg}"
    };

    match ProgressStyle::default_bar().template(template) {
        Ok(style) => bar.set_style(style.progress_chars("=>-")),
        Err(_) => bar.set_style(ProgressStyle::default_bar()),
    }
    bar
}
