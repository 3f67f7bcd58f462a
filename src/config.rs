// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "COMPANIES_INGEST";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub dataset: DatasetConfig,
    pub sampling: SamplingConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub credentials_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// `owner/slug` identifier understood by the retrieval tool
    pub slug: String,
    pub archive_file: String,
    pub raw_csv_file: String,
    pub clean_csv_file: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SamplingConfig {
    pub block_rows: usize,
    pub keep_columns: Vec<String>,
    pub null_markers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    pub command: String,
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl FetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Config {
    /// Layers built-in defaults, the TOML file and `COMPANIES_INGEST__*` variables.
    ///
    /// An explicit `path` must exist; without one, `config/default.toml` is
    /// read only if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            paths: PathsConfig {
                data_dir: PathBuf::from("./data"),
                credentials_dir: PathBuf::from("./secrets"),
            },
            dataset: DatasetConfig {
                slug: "peopledatalabssf/free-7-million-company-dataset".to_string(),
                archive_file: "companies.zip".to_string(),
                raw_csv_file: "companies.csv".to_string(),
                clean_csv_file: "companies_clean_sample.csv".to_string(),
            },
            sampling: SamplingConfig {
                block_rows: 200_000,
                keep_columns: [
                    "company_name",
                    "domain",
                    "industry",
                    "location",
                    "founded_year",
                    "employees_range",
                ]
                .iter()
                .map(|c| c.to_string())
                .collect(),
                null_markers: [
                    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
                    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
                ]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            },
            fetch: FetchConfig {
                command: "kaggle".to_string(),
                retries: 1,
                retry_delay_secs: 300,
            },
        }
    }

    /// Replaces the directory roots, typically from command-line flags.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        credentials_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.paths.data_dir = dir;
        }
        if let Some(dir) = credentials_dir {
            self.paths.credentials_dir = dir;
        }
        self
    }

    pub fn archive_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.dataset.archive_file)
    }

    pub fn raw_csv_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.dataset.raw_csv_file)
    }

    pub fn clean_csv_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.dataset.clean_csv_file)
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_dataset_slug(&self.dataset.slug)
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if self.sampling.block_rows == 0 {
            return Err(PipelineError::Config(
                "block_rows must be greater than 0".to_string(),
            ));
        }

        for (key, name) in [
            ("archive_file", &self.dataset.archive_file),
            ("raw_csv_file", &self.dataset.raw_csv_file),
            ("clean_csv_file", &self.dataset.clean_csv_file),
        ] {
            Validator::validate_file_name(name)
                .map_err(|e| PipelineError::Config(format!("{}: {}", key, e)))?;
        }

        if self.fetch.command.trim().is_empty() {
            return Err(PipelineError::Config(
                "fetch command must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
