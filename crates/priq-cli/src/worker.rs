//! Workers draining the egress endpoint.

use std::path::PathBuf;

use priq_stream::Egress;
use tracing::{debug, trace, warn};

use crate::manifest::FileRecord;
use crate::verify::{ExpectedFile, VerifyRecord, VerifyStatus};

/// Receives files until egress closes, stats each one, and returns what it
/// handled.
pub async fn run_worker(id: usize, egress: Egress<PathBuf>) -> Vec<FileRecord> {
    let mut records = Vec::new();

    while let Some(item) = egress.recv().await {
        let priority = item.priority;
        let path = item.into_value();

        let record = match tokio::fs::metadata(&path).await {
            Ok(meta) => {
                trace!(worker = id, path = %path.display(), size = meta.len(), "processed file");
                FileRecord {
                    path,
                    size: meta.len(),
                    priority,
                    worker: id,
                    error: None,
                }
            }
            Err(e) => {
                warn!(worker = id, path = %path.display(), error = %e, "failed to stat file");
                FileRecord {
                    path,
                    size: 0,
                    priority,
                    worker: id,
                    error: Some(e.to_string()),
                }
            }
        };
        records.push(record);
    }

    debug!(worker = id, handled = records.len(), "worker finished");
    records
}

/// Receives manifest entries until egress closes and checks each against
/// the file on disk.
pub async fn run_verify_worker(id: usize, egress: Egress<ExpectedFile>) -> Vec<VerifyRecord> {
    let mut records = Vec::new();

    while let Some(item) = egress.recv().await {
        let expected = item.into_value();
        let status = expected.check().await;
        if status != VerifyStatus::Same {
            debug!(worker = id, path = %expected.path.display(), ?status, "file differs from manifest");
        }
        records.push(VerifyRecord {
            path: expected.path,
            status,
            worker: id,
        });
    }

    debug!(worker = id, checked = records.len(), "verify worker finished");
    records
}
