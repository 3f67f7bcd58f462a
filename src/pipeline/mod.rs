// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod cleaner;
pub mod directories;
pub mod extractor;
pub mod fetcher;
mod orchestrator;
mod progress;
mod report;
pub mod step;

pub use cleaner::{SampleCleaner, SampleReport, normalize_column_name};
pub use directories::prepare_directory;
pub use extractor::{ExtractionReport, extract_first_csv};
pub use fetcher::{DatasetFetcher, KaggleCliFetcher, fetch_dataset};
pub use orchestrator::PipelineOrchestrator;
pub use progress::{PipelineStats, ProgressTracker};
pub use report::{RunReport, StepOutcome, StepStatus};
pub use step::{PipelineStep, RetryPolicy, StepOutput, execute_step};
