// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod utils;

pub use config::{Config, DatasetConfig, FetchConfig, PathsConfig, SamplingConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{
    DatasetFetcher, ExtractionReport, KaggleCliFetcher, PipelineOrchestrator, PipelineStats,
    PipelineStep, RunReport, SampleCleaner, SampleReport, StepOutcome, StepOutput, StepStatus,
    extract_first_csv, fetch_dataset, prepare_directory,
};
pub use utils::{AtomicFile, Validator};
