//! Checking a saved manifest against the files on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A manifest entry queued for checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFile {
    /// Where the file should be now.
    pub path: PathBuf,
    /// Size recorded in the manifest.
    pub size: u64,
}

impl ExpectedFile {
    /// Maps a recorded path from `manifest_root` onto `root`.
    ///
    /// Paths outside `manifest_root` are kept as recorded.
    pub fn relocate(manifest_root: &Path, root: &Path, recorded: &Path, size: u64) -> Self {
        let path = match recorded.strip_prefix(manifest_root) {
            Ok(relative) => root.join(relative),
            Err(_) => recorded.to_path_buf(),
        };
        Self { path, size }
    }

    /// Compares the file on disk with the recorded size.
    pub async fn check(&self) -> VerifyStatus {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_dir() => VerifyStatus::IsDir,
            Ok(meta) if meta.len() == self.size => VerifyStatus::Same,
            Ok(meta) => VerifyStatus::SizeDiffers {
                expected: self.size,
                actual: meta.len(),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => VerifyStatus::Missing,
            Err(e) => VerifyStatus::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Outcome of checking one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyStatus {
    Same,
    SizeDiffers { expected: u64, actual: u64 },
    Missing,
    IsDir,
    Error { message: String },
}

impl VerifyStatus {
    fn label(&self) -> String {
        match self {
            VerifyStatus::Same => "ok".to_string(),
            VerifyStatus::SizeDiffers { expected, actual } => {
                format!("size differs ({} -> {})", expected, actual)
            }
            VerifyStatus::Missing => "missing".to_string(),
            VerifyStatus::IsDir => "is a directory".to_string(),
            VerifyStatus::Error { message } => format!("error: {}", message),
        }
    }
}

/// One checked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRecord {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: VerifyStatus,
    pub worker: usize,
}

/// Result of a verify run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub checked_at: DateTime<Utc>,
    pub results: Vec<VerifyRecord>,
    pub same: usize,
    pub size_differs: usize,
    pub missing: usize,
    /// Directories where a file was expected, plus stat failures.
    pub errors: usize,
    /// Manifest entries without a recorded size.
    pub skipped: usize,
}

impl VerifyReport {
    /// Builds a report, sorting results by path.
    pub fn new(
        root: PathBuf,
        manifest: PathBuf,
        mut results: Vec<VerifyRecord>,
        skipped: usize,
    ) -> Self {
        results.sort_by(|a, b| a.path.cmp(&b.path));

        let mut report = Self {
            root,
            manifest,
            checked_at: Utc::now(),
            results: Vec::new(),
            same: 0,
            size_differs: 0,
            missing: 0,
            errors: 0,
            skipped,
        };
        for record in &results {
            match record.status {
                VerifyStatus::Same => report.same += 1,
                VerifyStatus::SizeDiffers { .. } => report.size_differs += 1,
                VerifyStatus::Missing => report.missing += 1,
                VerifyStatus::IsDir | VerifyStatus::Error { .. } => report.errors += 1,
            }
        }
        report.results = results;
        report
    }

    /// Number of files that do not match the manifest.
    pub fn problems(&self) -> usize {
        self.size_differs + self.missing + self.errors
    }

    /// Returns true if every checked file matched.
    pub fn is_clean(&self) -> bool {
        self.problems() == 0
    }

    /// Renders the mismatches as a plain-text table. Matching files are
    /// only counted.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{:<60} {:>6}  {}\n", "PATH", "WORKER", "STATUS"));
        out.push_str(&format!("{}\n", "-".repeat(91)));

        for record in self.results.iter().filter(|r| r.status != VerifyStatus::Same) {
            out.push_str(&format!(
                "{:<60} {:>6}  {}\n",
                record.path.display(),
                record.worker,
                record.status.label()
            ));
        }

        out.push_str(&format!(
            "\n{} same, {} size differs, {} missing, {} errors, {} skipped\n",
            self.same, self.size_differs, self.missing, self.errors, self.skipped
        ));
        out
    }
}
