// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref DATASET_SLUG: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap();
}

pub struct Validator;

impl Validator {
    /// Accepts `owner/slug` identifiers such as `peopledatalabssf/free-7-million-company-dataset`.
    pub fn validate_dataset_slug(slug: &str) -> Result<()> {
        if !DATASET_SLUG.is_match(slug) {
            return Err(PipelineError::Validation(format!(
                "Dataset identifier must look like owner/slug: {:?}",
                slug
            )));
        }
        Ok(())
    }

    /// A bare file name, joined onto the data directory.
    pub fn validate_file_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(PipelineError::Validation(
                "File name must not be empty".to_string(),
            ));
        }

        let path = Path::new(name);
        if path.file_name().and_then(|n| n.to_str()) != Some(name) {
            return Err(PipelineError::Validation(format!(
                "Expected a plain file name without directories: {}",
                name
            )));
        }

        Ok(())
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(PipelineError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
    }

    pub fn truncate_text(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            return text.to_string();
        }
        let mut end = max_length;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_dataset_slug() {
        assert!(
            Validator::validate_dataset_slug("peopledatalabssf/free-7-million-company-dataset")
                .is_ok()
        );
        assert!(Validator::validate_dataset_slug("owner/data.set_v2").is_ok());
        assert!(Validator::validate_dataset_slug("no-owner").is_err());
        assert!(Validator::validate_dataset_slug("a/b/c").is_err());
        assert!(Validator::validate_dataset_slug("owner/ slug").is_err());
        assert!(Validator::validate_dataset_slug("").is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(Validator::validate_file_name("companies.zip").is_ok());
        assert!(Validator::validate_file_name("").is_err());
        assert!(Validator::validate_file_name("../companies.zip").is_err());
        assert!(Validator::validate_file_name("/tmp/companies.zip").is_err());
    }

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(Path::new("/nonexistent/dir")).is_err());
    }

    #[test]
    fn test_has_extension() {
        assert!(Validator::has_extension(Path::new("a/b.ZIP"), "zip"));
        assert!(Validator::has_extension(Path::new("b.zip"), "zip"));
        assert!(!Validator::has_extension(Path::new("b.csv"), "zip"));
        assert!(!Validator::has_extension(Path::new("zip"), "zip"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(Validator::truncate_text("abcdefghij", 4), "abcd...");
        assert_eq!(Validator::truncate_text("ééé", 3), "é...");
    }
}
