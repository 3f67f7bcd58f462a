// file: src/pipeline/extractor.rs
// description: copies the first CSV member of the dataset archive to the raw CSV path
// reference: https://docs.rs/zip

use crate::error::{PipelineError, Result};
use crate::utils::AtomicFile;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtractionReport {
    pub entry_name: String,
    pub bytes_written: u64,
    pub sha256: String,
}

/// Writes the first `.csv` entry of `archive_path` (listing order, suffix
/// case-insensitive) to `raw_csv_path`, replacing any previous file.
pub fn extract_first_csv(archive_path: &Path, raw_csv_path: &Path) -> Result<ExtractionReport> {
    if !archive_path.exists() {
        return Err(PipelineError::MissingArchive(archive_path.to_path_buf()));
    }

    let file = File::open(archive_path).map_err(|e| PipelineError::file_op(archive_path, e))?;
    let mut archive = ZipArchive::new(file)?;
    debug!(
        "Archive {} has {} entries",
        archive_path.display(),
        archive.len()
    );

    let index = first_csv_entry(&mut archive)?
        .ok_or_else(|| PipelineError::NoCsvFound(archive_path.to_path_buf()))?;

    let mut entry = archive.by_index(index)?;
    let entry_name = entry.name().to_string();
    info!("Extracting {} to {}", entry_name, raw_csv_path.display());

    let out = AtomicFile::create(raw_csv_path)?;
    let mut out = HashingWriter::new(out);
    let bytes_written = io::copy(&mut entry, &mut out)
        .map_err(|e| PipelineError::file_op(raw_csv_path, e))?;

    let (out, sha256) = out.finish();
    out.persist()?;

    info!("Wrote {} bytes to {}", bytes_written, raw_csv_path.display());

    Ok(ExtractionReport {
        entry_name,
        bytes_written,
        sha256,
    })
}

fn first_csv_entry<R: Read + io::Seek>(archive: &mut ZipArchive<R>) -> Result<Option<usize>> {
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if is_csv_name(entry.name()) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn is_csv_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".csv")
}

/// Tees written bytes into a SHA-256 digest.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> (W, String) {
        (self.inner, format!("{:x}", self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;
    use zip::CompressionMethod;
    use zip::write::FileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        write_zip_with(path, entries, CompressionMethod::Stored);
    }

    fn write_zip_with(path: &Path, entries: &[(&str, &str)], method: CompressionMethod) {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> = FileOptions::default().compression_method(method);
            for (name, content) in entries {
                if name.ends_with('/') {
                    zip.add_directory(*name, options).unwrap();
                    continue;
                }
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        fs::write(path, buf).unwrap();
    }

    #[test]
    fn test_extracts_first_csv_in_listing_order() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("companies.zip");
        let raw = temp.path().join("companies.csv");
        write_zip(
            &archive,
            &[
                ("README.md", "docs"),
                ("z_first.csv", "a,b\n1,2\n"),
                ("a_second.csv", "c,d\n3,4\n"),
            ],
        );

        let report = extract_first_csv(&archive, &raw).unwrap();

        assert_eq!(report.entry_name, "z_first.csv");
        assert_eq!(report.bytes_written, 8);
        assert_eq!(fs::read(&raw).unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_deflated_entry_is_copied_byte_for_byte() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("companies.zip");
        let raw = temp.path().join("companies.csv");

        let mut content = String::from("company_name,domain,industry\n");
        for i in 0..1_000 {
            content.push_str(&format!("Company {i},company{i}.com,industry {}\n", i % 7));
        }
        write_zip_with(
            &archive,
            &[("dir/", ""), ("dir/Data.Csv", content.as_str())],
            CompressionMethod::Deflated,
        );

        let report = extract_first_csv(&archive, &raw).unwrap();

        assert_eq!(report.entry_name, "dir/Data.Csv");
        assert_eq!(report.bytes_written, content.len() as u64);
        assert_eq!(fs::read_to_string(&raw).unwrap(), content);
    }

    #[test]
    fn test_suffix_match_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("companies.zip");
        let raw = temp.path().join("companies.csv");
        let content = "Company Name,Domain,Industry\nAcme,acme.com,tools\nGlobex,,energy\nInitech,initech.com,software\n";
        write_zip(&archive, &[("Companies Export.CSV", content)]);

        let report = extract_first_csv(&archive, &raw).unwrap();

        assert_eq!(report.entry_name, "Companies Export.CSV");
        assert_eq!(fs::read_to_string(&raw).unwrap(), content);
    }

    #[test]
    fn test_missing_archive() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("companies.csv");

        let err = extract_first_csv(&temp.path().join("nope.zip"), &raw).unwrap_err();
        assert!(matches!(err, PipelineError::MissingArchive(_)));
        assert!(!raw.exists());
    }

    #[test]
    fn test_no_csv_entry_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("companies.zip");
        let raw = temp.path().join("companies.csv");
        write_zip(&archive, &[("data.json", "{}"), ("csv/", "")]);

        let err = extract_first_csv(&archive, &raw).unwrap_err();
        assert!(matches!(err, PipelineError::NoCsvFound(_)));
        assert!(!raw.exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_extraction_is_idempotent_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("companies.zip");
        let raw = temp.path().join("companies.csv");
        fs::write(&raw, "previous run leftovers that are longer").unwrap();
        write_zip(&archive, &[("companies.csv", "x\n1\n")]);

        let first = extract_first_csv(&archive, &raw).unwrap();
        let first_bytes = fs::read(&raw).unwrap();
        let second = extract_first_csv(&archive, &raw).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, b"x\n1\n");
        assert_eq!(fs::read(&raw).unwrap(), first_bytes);
    }

    #[test]
    fn test_report_digest_matches_content() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("companies.zip");
        let raw = temp.path().join("companies.csv");
        write_zip(&archive, &[("c.csv", "hello")]);

        let report = extract_first_csv(&archive, &raw).unwrap();
        assert_eq!(
            report.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_corrupt_archive_is_archive_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("companies.zip");
        fs::write(&archive, "definitely not a zip").unwrap();

        let err = extract_first_csv(&archive, &temp.path().join("out.csv")).unwrap_err();
        assert_eq!(err.kind(), "ArchiveError");
    }
}
