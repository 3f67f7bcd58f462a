// file: src/pipeline/cleaner.rs
// description: bounded sampling, column normalization and projection of the raw CSV
// reference: https://docs.rs/csv

use crate::config::SamplingConfig;
use crate::error::{PipelineError, Result};
use crate::utils::AtomicFile;
use csv::{ByteRecord, ErrorKind, ReaderBuilder, Terminator, WriterBuilder};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

const DOMAIN_COLUMN: &str = "domain";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SampleReport {
    pub rows_read: usize,
    pub rows_malformed: usize,
    pub rows_dropped_missing_domain: usize,
    pub rows_written: usize,
    pub columns: Vec<String>,
}

pub struct SampleCleaner {
    block_rows: usize,
    keep_columns: HashSet<String>,
    null_markers: HashSet<Vec<u8>>,
}

impl SampleCleaner {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            block_rows: config.block_rows,
            keep_columns: config.keep_columns.iter().cloned().collect(),
            null_markers: config
                .null_markers
                .iter()
                .map(|m| m.as_bytes().to_vec())
                .collect(),
        }
    }

    /// Reads at most `block_rows` well-formed rows of `raw_csv_path` and
    /// writes the filtered, projected sample to `clean_csv_path`.
    pub fn clean(&self, raw_csv_path: &Path, clean_csv_path: &Path) -> Result<SampleReport> {
        let read_error = |message: String| PipelineError::Read {
            path: raw_csv_path.to_path_buf(),
            message,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_path(raw_csv_path)
            .map_err(|e| read_error(e.to_string()))?;

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|e| read_error(e.to_string()))?
            .iter()
            .map(|h| normalize_column_name(&String::from_utf8_lossy(h)))
            .collect();

        if headers.is_empty() {
            return Err(read_error("file has no header row".to_string()));
        }

        let domain_index = headers.iter().position(|h| h == DOMAIN_COLUMN);
        let projection = self.projection(&headers);
        let columns: Vec<String> = projection.iter().map(|&i| headers[i].clone()).collect();

        if domain_index.is_none() {
            debug!("No domain column; rows are not filtered");
        }
        if !headers.iter().any(|h| self.keep_columns.contains(h)) {
            warn!(
                "No allow-listed columns present; keeping all {} columns",
                headers.len()
            );
        }

        let out = AtomicFile::create(clean_csv_path)?;
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        writer.write_record(&columns)?;

        let mut report = SampleReport {
            rows_read: 0,
            rows_malformed: 0,
            rows_dropped_missing_domain: 0,
            rows_written: 0,
            columns,
        };

        let mut record = ByteRecord::new();
        let mut projected = ByteRecord::new();

        while report.rows_read < self.block_rows {
            match reader.read_byte_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) if err.is_io_error() => return Err(read_error(err.to_string())),
                Err(err) => {
                    if let ErrorKind::UnequalLengths { pos, .. } = err.kind() {
                        debug!(
                            "Skipping malformed row at line {}",
                            pos.as_ref().map(|p| p.line()).unwrap_or(0)
                        );
                    }
                    report.rows_malformed += 1;
                    continue;
                }
            }

            report.rows_read += 1;

            if let Some(index) = domain_index
                && record.get(index).is_none_or(|v| self.is_null(v))
            {
                report.rows_dropped_missing_domain += 1;
                continue;
            }

            projected.clear();
            for &index in &projection {
                match record.get(index) {
                    Some(value) if !self.is_null(value) => projected.push_field(value),
                    _ => projected.push_field(b""),
                }
            }
            writer.write_byte_record(&projected)?;
            report.rows_written += 1;
        }

        writer
            .flush()
            .map_err(|e| PipelineError::file_op(clean_csv_path, e))?;
        let out = writer.into_inner().map_err(|e| {
            PipelineError::file_op(
                clean_csv_path,
                io::Error::new(e.error().kind(), e.error().to_string()),
            )
        })?;
        out.persist()?;

        info!(
            "Sampled {} rows ({} malformed skipped, {} without domain dropped), wrote {} rows to {}",
            report.rows_read,
            report.rows_malformed,
            report.rows_dropped_missing_domain,
            report.rows_written,
            clean_csv_path.display()
        );

        Ok(report)
    }

    /// Indices of allow-listed columns in file order, or every column when none match.
    fn projection(&self, headers: &[String]) -> Vec<usize> {
        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| self.keep_columns.contains(*h))
            .map(|(i, _)| i)
            .collect();

        if kept.is_empty() {
            (0..headers.len()).collect()
        } else {
            kept
        }
    }

    fn is_null(&self, value: &[u8]) -> bool {
        value.is_empty() || self.null_markers.contains(value)
    }
}

/// `" Company Name "` becomes `"company_name"`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn cleaner() -> SampleCleaner {
        SampleCleaner::new(&Config::default_config().sampling)
    }

    fn run(raw: &str) -> (SampleReport, String) {
        run_with(&cleaner(), raw)
    }

    fn run_with(cleaner: &SampleCleaner, raw: &str) -> (SampleReport, String) {
        let temp = TempDir::new().unwrap();
        let raw_path = temp.path().join("companies.csv");
        let clean_path = temp.path().join("companies_clean_sample.csv");
        fs::write(&raw_path, raw).unwrap();

        let report = cleaner.clean(&raw_path, &clean_path).unwrap();
        (report, fs::read_to_string(&clean_path).unwrap())
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name(" Company Name "), "company_name");
        assert_eq!(normalize_column_name("Employees Range"), "employees_range");
        assert_eq!(normalize_column_name("DOMAIN"), "domain");
        assert_eq!(normalize_column_name("a  b"), "a__b");
    }

    #[test]
    fn test_drops_rows_without_domain() {
        let (report, output) = run(
            "Company Name,Domain,Industry\nAcme,acme.com,tools\nGlobex,,energy\nInitech,initech.com,software\n",
        );

        assert_eq!(
            output,
            "company_name,domain,industry\nAcme,acme.com,tools\nInitech,initech.com,software\n"
        );
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_dropped_missing_domain, 1);
        assert_eq!(report.rows_written, 2);
    }

    #[test]
    fn test_no_domain_column_keeps_all_rows() {
        let (report, output) = run("Company Name,Industry,Notes\nAcme,,x\nGlobex,energy,y\n");

        assert_eq!(output, "company_name,industry\nAcme,\nGlobex,energy\n");
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.rows_dropped_missing_domain, 0);
    }

    #[test]
    fn test_projection_keeps_file_order() {
        let (report, output) = run(
            "size,Location,internal id,Domain,Company Name\n10,Oslo,1,a.no,A\n20,Rome,2,b.it,B\n",
        );

        assert_eq!(report.columns, vec!["location", "domain", "company_name"]);
        assert_eq!(output, "location,domain,company_name\nOslo,a.no,A\nRome,b.it,B\n");
    }

    #[test]
    fn test_no_allowed_columns_keeps_everything() {
        let (report, output) = run("Alpha,Beta\n1,2\n3,4\n");

        assert_eq!(report.columns, vec!["alpha", "beta"]);
        assert_eq!(output, "alpha,beta\n1,2\n3,4\n");
    }

    #[test]
    fn test_null_markers_count_as_missing() {
        let (report, output) = run("domain,industry\nNA,tools\nnull,x\nacme.com,N/A\n");

        assert_eq!(report.rows_dropped_missing_domain, 2);
        assert_eq!(output, "domain,industry\nacme.com,\n");
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let (report, output) =
            run("domain,industry\na.com,tools\nb.com,too,many\nc.com\nd.com,energy\n");

        assert_eq!(report.rows_malformed, 2);
        assert_eq!(report.rows_read, 2);
        assert_eq!(output, "domain,industry\na.com,tools\nd.com,energy\n");
    }

    #[test]
    fn test_block_limit_caps_rows() {
        let mut config = Config::default_config().sampling;
        config.block_rows = 2;
        let cleaner = SampleCleaner::new(&config);

        let (report, output) = run_with(&cleaner, "domain\na.com\n\"\"\nc.com\nd.com\n");

        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rows_written, 1);
        assert_eq!(output, "domain\na.com\n");
    }

    #[test]
    fn test_header_only_output_when_everything_filtered() {
        let (report, output) = run("Domain,Industry\n,tools\n,energy\n");

        assert_eq!(report.rows_written, 0);
        assert_eq!(output, "domain,industry\n");
    }

    #[test]
    fn test_quoted_values_survive() {
        let (_, output) = run("domain,location\na.com,\"Austin, TX\"\nb.com,\"Line\nbreak\"\n");

        assert_eq!(output, "domain,location\na.com,\"Austin, TX\"\nb.com,\"Line\nbreak\"\n");
    }

    #[test]
    fn test_missing_raw_csv_is_read_error() {
        let temp = TempDir::new().unwrap();
        let clean_path = temp.path().join("clean.csv");

        let err = cleaner()
            .clean(&temp.path().join("missing.csv"), &clean_path)
            .unwrap_err();
        assert_eq!(err.kind(), "ReadError");
        assert!(!clean_path.exists());
    }

    #[test]
    fn test_empty_raw_csv_is_read_error() {
        let temp = TempDir::new().unwrap();
        let raw_path = temp.path().join("companies.csv");
        fs::write(&raw_path, "").unwrap();

        let err = cleaner()
            .clean(&raw_path, &temp.path().join("clean.csv"))
            .unwrap_err();
        assert_eq!(err.kind(), "ReadError");
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let raw_path = temp.path().join("companies.csv");
        let clean_path = temp.path().join("clean.csv");
        fs::write(&raw_path, "Domain,Founded Year\na.com,1999\n,2001\nb.com,\n").unwrap();

        let cleaner = cleaner();
        cleaner.clean(&raw_path, &clean_path).unwrap();
        let first = fs::read(&clean_path).unwrap();
        cleaner.clean(&raw_path, &clean_path).unwrap();

        assert_eq!(fs::read(&clean_path).unwrap(), first);
        assert_eq!(first, b"domain,founded_year\na.com,1999\nb.com,\n");
    }
}
