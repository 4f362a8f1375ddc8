//! Directory walker feeding discovered files into the queue.

use std::path::{Path, PathBuf};

use priq_stream::{Ingress, Item};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::cli::PriorityKey;
use crate::error::{CliError, Result};

/// Counters from one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Files sent into the queue.
    pub discovered: usize,
    /// Entries that could not be read.
    pub errors: usize,
}

impl PriorityKey {
    /// Priority of a discovered file under this key.
    pub fn priority_for(&self, entry: &DirEntry) -> i64 {
        match self {
            PriorityKey::PathLen => entry.path().as_os_str().len() as i64,
            PriorityKey::Size => entry
                .metadata()
                .map(|m| i64::try_from(m.len()).unwrap_or(i64::MAX))
                .unwrap_or(0),
            PriorityKey::Depth => entry.depth() as i64,
        }
    }
}

/// Checks that `root` exists and is a directory.
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(CliError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CliError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Walks `root` and sends every regular file into `ingress`.
///
/// Blocking: run it on a blocking thread. Unreadable entries are logged
/// and skipped; the walk keeps going.
pub fn walk(
    root: &Path,
    max_depth: Option<usize>,
    key: PriorityKey,
    ingress: &Ingress<PathBuf>,
) -> Result<WalkStats> {
    validate_root(root)?;

    let mut stats = WalkStats::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth.unwrap_or(usize::MAX));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "error accessing entry");
                stats.errors += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let priority = key.priority_for(&entry);
        trace!(path = %entry.path().display(), priority, "discovered file");
        ingress.blocking_send(Item::new(entry.into_path(), priority))?;
        stats.discovered += 1;
    }

    debug!(
        root = %root.display(),
        discovered = stats.discovered,
        errors = stats.errors,
        "walk complete"
    );

    Ok(stats)
}
