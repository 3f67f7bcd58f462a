// file: src/pipeline/report.rs
// description: serializable summary of one pipeline run

use crate::error::{PipelineError, Result};
use crate::pipeline::progress::PipelineStats;
use crate::pipeline::step::{PipelineStep, StepOutput};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub task_id: String,
    pub status: StepStatus,
    pub attempts: u32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StepOutput>,
}

impl StepOutcome {
    pub fn succeeded(step: PipelineStep, attempts: u32, duration_ms: u64, output: StepOutput) -> Self {
        Self {
            task_id: step.task_id().to_string(),
            status: StepStatus::Succeeded,
            attempts,
            duration_ms,
            error_kind: None,
            error: None,
            detail: Some(output),
        }
    }

    pub fn failed(step: PipelineStep, attempts: u32, duration_ms: u64, err: &PipelineError) -> Self {
        Self {
            task_id: step.task_id().to_string(),
            status: StepStatus::Failed,
            attempts,
            duration_ms,
            error_kind: Some(err.kind().to_string()),
            error: Some(err.to_string()),
            detail: None,
        }
    }

    pub fn skipped(step: PipelineStep) -> Self {
        Self {
            task_id: step.task_id().to_string(),
            status: StepStatus::Skipped,
            attempts: 0,
            duration_ms: 0,
            error_kind: None,
            error: None,
            detail: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub dataset: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepOutcome>,
    pub stats: PipelineStats,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.status != StepStatus::Failed)
    }

    pub fn failed_step(&self) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| PipelineError::file_op(path, e))
    }
}
