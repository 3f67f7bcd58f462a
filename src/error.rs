// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to prepare directory {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Dataset fetch failed: {0}")]
    Fetch(String),

    #[error("Archive not found: {}", .0.display())]
    MissingArchive(PathBuf),

    #[error("No CSV entry found in archive {}", .0.display())]
    NoCsvFound(PathBuf),

    #[error("Failed to read raw CSV {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("File operation failed for {}: {source}", .path.display())]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Step task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Stable name of the error kind, as surfaced to whatever runs the step.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "ConfigError",
            PipelineError::Setup { .. } => "SetupError",
            PipelineError::Fetch(_) => "FetchError",
            PipelineError::MissingArchive(_) => "MissingArchiveError",
            PipelineError::NoCsvFound(_) => "NoCSVFoundError",
            PipelineError::Read { .. } => "ReadError",
            PipelineError::FileOperation { .. } => "FileOperationError",
            PipelineError::Archive(_) => "ArchiveError",
            PipelineError::Csv(_) => "CsvError",
            PipelineError::Validation(_) => "ValidationError",
            PipelineError::Serialization(_) => "SerializationError",
            PipelineError::Task(_) => "TaskError",
        }
    }

    pub(crate) fn file_op(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::FileOperation {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let missing = PipelineError::MissingArchive(PathBuf::from("/data/companies.zip"));
        assert_eq!(missing.kind(), "MissingArchiveError");
        assert_eq!(
            missing.to_string(),
            "Archive not found: /data/companies.zip"
        );

        let no_csv = PipelineError::NoCsvFound(PathBuf::from("a.zip"));
        assert_eq!(no_csv.kind(), "NoCSVFoundError");

        let fetch = PipelineError::Fetch("exit status 1".to_string());
        assert_eq!(fetch.kind(), "FetchError");
    }

    #[test]
    fn test_setup_error_names_path() {
        let err = PipelineError::Setup {
            path: PathBuf::from("/opt/data"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kind(), "SetupError");
        assert!(err.to_string().contains("/opt/data"));
    }
}
