// file: src/pipeline/step.rs
// description: step identifiers, retry policy and single-step dispatch

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::pipeline::cleaner::{SampleCleaner, SampleReport};
use crate::pipeline::directories::prepare_directory;
use crate::pipeline::extractor::{ExtractionReport, extract_first_csv};
use crate::pipeline::fetcher::{DatasetFetcher, fetch_dataset};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStep {
    PrepareDirectories,
    FetchDataset,
    ExtractArchive,
    CleanSample,
}

impl PipelineStep {
    /// Execution order.
    pub const ALL: [PipelineStep; 4] = [
        PipelineStep::PrepareDirectories,
        PipelineStep::FetchDataset,
        PipelineStep::ExtractArchive,
        PipelineStep::CleanSample,
    ];

    pub fn task_id(&self) -> &'static str {
        match self {
            PipelineStep::PrepareDirectories => "prepare-directories",
            PipelineStep::FetchDataset => "fetch-dataset",
            PipelineStep::ExtractArchive => "extract-archive",
            PipelineStep::CleanSample => "clean-sample",
        }
    }

    /// Only the download is retried.
    pub fn retry_policy(&self, config: &Config) -> RetryPolicy {
        match self {
            PipelineStep::FetchDataset => RetryPolicy {
                attempts: config.fetch.retries.saturating_add(1),
                delay: config.fetch.retry_delay(),
            },
            _ => RetryPolicy::none(),
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task_id())
    }
}

impl FromStr for PipelineStep {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        PipelineStep::ALL
            .into_iter()
            .find(|step| step.task_id() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = PipelineStep::ALL.iter().map(|s| s.task_id()).collect();
                PipelineError::Validation(format!(
                    "Unknown task {:?}; expected one of {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; never below 1.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StepOutput {
    Prepared { data_dir: PathBuf },
    Fetched { archive: PathBuf },
    Extracted(ExtractionReport),
    Cleaned(SampleReport),
}

/// Runs one step to completion against the configured paths.
pub fn execute_step(
    step: PipelineStep,
    config: &Config,
    fetcher: &dyn DatasetFetcher,
) -> Result<StepOutput> {
    match step {
        PipelineStep::PrepareDirectories => {
            prepare_directory(&config.paths.data_dir)?;
            Ok(StepOutput::Prepared {
                data_dir: config.paths.data_dir.clone(),
            })
        }
        PipelineStep::FetchDataset => {
            let archive = fetch_dataset(
                fetcher,
                &config.dataset.slug,
                &config.paths.data_dir,
                &config.archive_path(),
            )?;
            Ok(StepOutput::Fetched { archive })
        }
        PipelineStep::ExtractArchive => {
            let report = extract_first_csv(&config.archive_path(), &config.raw_csv_path())?;
            Ok(StepOutput::Extracted(report))
        }
        PipelineStep::CleanSample => {
            let cleaner = SampleCleaner::new(&config.sampling);
            let report = cleaner.clean(&config.raw_csv_path(), &config.clean_csv_path())?;
            Ok(StepOutput::Cleaned(report))
        }
    }
}
