//! Report of one walk: every file a worker handled.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One file as handled by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Size in bytes, or 0 when `error` is set.
    pub size: u64,
    pub priority: i64,
    /// Worker that handled the file.
    pub worker: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full walk report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<FileRecord>,
    pub total_size: u64,
    /// Walk entries plus files that failed to stat.
    pub errors: usize,
}

impl Manifest {
    /// Builds a manifest, sorting files by path.
    pub fn new(root: PathBuf, mut files: Vec<FileRecord>, walk_errors: usize) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let total_size = files.iter().map(|f| f.size).sum();
        let errors = walk_errors + files.iter().filter(|f| f.error.is_some()).count();

        Self {
            root,
            generated_at: Utc::now(),
            files,
            total_size,
            errors,
        }
    }

    /// Reads a manifest written by `walk --format json`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Renders the manifest as a plain-text table.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<60} {:>12} {:>10} {:>6}\n",
            "PATH", "SIZE", "PRIORITY", "WORKER"
        ));
        out.push_str(&format!("{}\n", "-".repeat(91)));

        for file in &self.files {
            let path = file.path.display().to_string();
            match &file.error {
                Some(err) => out.push_str(&format!(
                    "{:<60} {:>12} {:>10} {:>6}  ({})\n",
                    path, "-", file.priority, file.worker, err
                )),
                None => out.push_str(&format!(
                    "{:<60} {:>12} {:>10} {:>6}\n",
                    path, file.size, file.priority, file.worker
                )),
            }
        }

        out.push_str(&format!(
            "\n{} files, {} bytes, {} errors\n",
            self.files.len(),
            self.total_size,
            self.errors
        ));
        out
    }
}
