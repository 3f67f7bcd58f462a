// file: src/utils/atomic.rs
// description: write-to-temp then rename file replacement
// reference: https://docs.rs/tempfile

use crate::error::{PipelineError, Result};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Buffered writer whose content only appears at `final_path` once `persist` succeeds.
///
/// The temporary file lives next to the destination so the rename stays on
/// one filesystem. Dropping without `persist` removes it.
pub struct AtomicFile {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl AtomicFile {
    pub fn create(final_path: impl AsRef<Path>) -> Result<Self> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent = match final_path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => {
                return Err(PipelineError::Validation(format!(
                    "Cannot determine parent directory for: {}",
                    final_path.display()
                )));
            }
        };

        let temp = NamedTempFile::new_in(parent).map_err(|e| PipelineError::file_op(parent, e))?;

        Ok(Self {
            writer: BufWriter::new(temp),
            final_path,
        })
    }

    pub fn persist(self) -> Result<PathBuf> {
        let final_path = self.final_path;

        let temp = self
            .writer
            .into_inner()
            .map_err(|e| PipelineError::file_op(&final_path, e.into_error()))?;

        temp.as_file()
            .sync_all()
            .map_err(|e| PipelineError::file_op(&final_path, e))?;

        temp.persist(&final_path)
            .map_err(|e| PipelineError::file_op(&final_path, e.error))?;

        Ok(final_path)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
