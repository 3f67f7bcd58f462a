// file: src/pipeline/fetcher.rs
// description: dataset download through an external retrieval tool
// reference: https://github.com/Kaggle/kaggle-api

use crate::config::FetchConfig;
use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Something that can place a dataset archive into a directory.
pub trait DatasetFetcher: Send + Sync {
    /// Downloads `dataset` into `dest_dir` and returns the archive it produced.
    fn fetch(&self, dataset: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// Runs `<command> datasets download -d <dataset> -p <dest_dir> -o`.
pub struct KaggleCliFetcher {
    command: String,
    credentials_dir: PathBuf,
}

impl KaggleCliFetcher {
    pub fn new(config: &FetchConfig, credentials_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: config.command.clone(),
            credentials_dir: credentials_dir.into(),
        }
    }
}

impl DatasetFetcher for KaggleCliFetcher {
    fn fetch(&self, dataset: &str, dest_dir: &Path) -> Result<PathBuf> {
        let before = snapshot_archives(dest_dir);

        info!("Downloading {} with `{}`", dataset, self.command);
        let output = Command::new(&self.command)
            .args(["datasets", "download", "-d", dataset, "-p"])
            .arg(dest_dir)
            .arg("-o")
            .env("KAGGLE_CONFIG_DIR", &self.credentials_dir)
            .output()
            .map_err(|e| {
                PipelineError::Fetch(format!("Failed to launch `{}`: {}", self.command, e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", self.command, stdout.trim());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Fetch(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                Validator::truncate_text(stderr.trim(), 500)
            )));
        }

        newest_new_archive(dest_dir, &before).ok_or_else(|| {
            PipelineError::Fetch(format!(
                "`{}` succeeded but no archive appeared in {}",
                self.command,
                dest_dir.display()
            ))
        })
    }
}

/// Fetches `dataset` and moves the produced archive to `archive_path`.
pub fn fetch_dataset(
    fetcher: &dyn DatasetFetcher,
    dataset: &str,
    dest_dir: &Path,
    archive_path: &Path,
) -> Result<PathBuf> {
    Validator::validate_dataset_slug(dataset)?;
    Validator::validate_directory(dest_dir).map_err(|e| PipelineError::Fetch(e.to_string()))?;

    let produced = fetcher.fetch(dataset, dest_dir)?;

    if !produced.is_file() {
        return Err(PipelineError::Fetch(format!(
            "Expected archive {} does not exist",
            produced.display()
        )));
    }

    if produced != archive_path {
        relocate(&produced, archive_path)?;
    }

    let size = fs::metadata(archive_path)
        .map_err(|e| PipelineError::file_op(archive_path, e))?
        .len();
    info!(
        "Dataset archive ready at {} ({} bytes)",
        archive_path.display(),
        size
    );

    Ok(archive_path.to_path_buf())
}

fn relocate(from: &Path, to: &Path) -> Result<()> {
    debug!("Moving {} to {}", from.display(), to.display());

    if let Err(err) = fs::rename(from, to) {
        warn!("Rename failed ({}), copying archive instead", err);
        fs::copy(from, to).map_err(|e| PipelineError::file_op(to, e))?;
        fs::remove_file(from).map_err(|e| PipelineError::file_op(from, e))?;
    }

    Ok(())
}

fn zip_files(dir: &Path) -> impl Iterator<Item = (PathBuf, SystemTime)> {
    WalkDir::new(dir)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && Validator::has_extension(e.path(), "zip"))
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some((e.into_path(), modified))
        })
}

fn snapshot_archives(dir: &Path) -> HashMap<PathBuf, SystemTime> {
    zip_files(dir).collect()
}

/// Newest `.zip` in `dir` that is new or was rewritten since `before` was taken.
fn newest_new_archive(dir: &Path, before: &HashMap<PathBuf, SystemTime>) -> Option<PathBuf> {
    zip_files(dir)
        .filter(|(path, modified)| before.get(path) != Some(modified))
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path)
}
