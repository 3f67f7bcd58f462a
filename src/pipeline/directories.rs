// file: src/pipeline/directories.rs
// description: working directory preparation

use crate::error::{PipelineError, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Creates `dir` and any missing parents. An existing directory is fine.
pub fn prepare_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        debug!("Data directory already present: {}", dir.display());
        return Ok(());
    }

    if dir.exists() {
        return Err(PipelineError::Setup {
            path: dir.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "path exists and is not a directory",
            ),
        });
    }

    fs::create_dir_all(dir).map_err(|source| PipelineError::Setup {
        path: dir.to_path_buf(),
        source,
    })?;

    info!("Created data directory {}", dir.display());
    Ok(())
}
