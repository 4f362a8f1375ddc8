//! Command implementations.

use std::path::PathBuf;

use priq_stream::{ChannelizedQueue, Item, StreamConfig};
use tracing::{debug, info, warn};

use crate::cli::{Commands, OutputFormat, PriorityKey};
use crate::manifest::Manifest;
use crate::verify::{ExpectedFile, VerifyReport};
use crate::walker::{self, WalkStats};
use crate::worker::{run_verify_worker, run_worker};

pub use crate::error::{CliError, Result};

/// Options for one `walk` run.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub root: PathBuf,
    pub workers: usize,
    pub priority: PriorityKey,
    pub max_depth: Option<usize>,
}

/// Options for one `verify` run.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub workers: usize,
}

/// Execute a CLI command.
pub async fn execute(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Walk {
            root,
            workers,
            priority,
            format,
            max_depth,
        } => {
            let options = WalkOptions {
                root,
                workers,
                priority,
                max_depth,
            };
            let manifest = walk(options).await?;
            print_manifest(&manifest, format)
        }
        Commands::Verify {
            root,
            manifest,
            workers,
            format,
        } => {
            let options = VerifyOptions {
                root,
                manifest,
                workers,
            };
            let report = verify(options).await?;
            match format {
                OutputFormat::Table => print!("{}", report.to_table()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
            if report.is_clean() {
                Ok(())
            } else {
                Err(CliError::Mismatch(report.problems()))
            }
        }
    }
}

fn print_manifest(manifest: &Manifest, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", manifest.to_table()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(manifest)?),
    }
    Ok(())
}

/// Runs the walk pipeline and returns the finished manifest.
///
/// Returns only after the walker, the adapter's forwarders, and every worker
/// have finished, so each discovered file appears exactly once.
pub async fn walk(options: WalkOptions) -> Result<Manifest> {
    walker::validate_root(&options.root)?;

    let worker_count = options.workers.max(1);
    let cpq = ChannelizedQueue::with_config(StreamConfig::default());

    info!(
        root = %options.root.display(),
        workers = worker_count,
        priority = ?options.priority,
        "starting walk"
    );

    let workers: Vec<_> = (0..worker_count)
        .map(|id| tokio::spawn(run_worker(id, cpq.egress_endpoint())))
        .collect();

    let ingress = cpq.ingress_endpoint();
    let root = options.root.clone();
    let walked = tokio::task::spawn_blocking(move || {
        walker::walk(&root, options.max_depth, options.priority, &ingress)
    })
    .await;

    // Close before inspecting the walk result so workers always get released.
    cpq.close();

    let mut files = Vec::new();
    for handle in workers {
        files.extend(handle.await?);
    }
    cpq.join().await?;

    let stats: WalkStats = walked??;
    debug!(
        discovered = stats.discovered,
        handled = files.len(),
        "pipeline drained"
    );

    let manifest = Manifest::new(options.root, files, stats.errors);
    info!(
        files = manifest.files.len(),
        total_size = manifest.total_size,
        errors = manifest.errors,
        "walk complete"
    );
    Ok(manifest)
}

/// Checks every file in a saved manifest against `root`.
///
/// Recorded paths are re-rooted from the manifest's root onto `root`, so a
/// copied tree can be checked against the original's manifest. Entries
/// are handed to workers through the priority queue using their recorded
/// priority.
pub async fn verify(options: VerifyOptions) -> Result<VerifyReport> {
    walker::validate_root(&options.root)?;
    let manifest = Manifest::load(&options.manifest)?;

    let worker_count = options.workers.max(1);
    let cpq = ChannelizedQueue::with_config(StreamConfig::default());

    info!(
        root = %options.root.display(),
        manifest = %options.manifest.display(),
        entries = manifest.files.len(),
        workers = worker_count,
        "starting verify"
    );

    let workers: Vec<_> = (0..worker_count)
        .map(|id| tokio::spawn(run_verify_worker(id, cpq.egress_endpoint())))
        .collect();

    let ingress = cpq.ingress_endpoint();
    let mut skipped = 0usize;
    let sent = async {
        for record in &manifest.files {
            if record.error.is_some() {
                warn!(path = %record.path.display(), "no recorded size, skipping");
                skipped += 1;
                continue;
            }
            let expected =
                ExpectedFile::relocate(&manifest.root, &options.root, &record.path, record.size);
            ingress.send(Item::new(expected, record.priority)).await?;
        }
        Ok::<(), CliError>(())
    }
    .await;

    // Close before inspecting the send result so workers always get released.
    cpq.close();

    let mut results = Vec::new();
    for handle in workers {
        results.extend(handle.await?);
    }
    cpq.join().await?;
    sent?;

    let report = VerifyReport::new(options.root, options.manifest, results, skipped);
    info!(
        same = report.same,
        size_differs = report.size_differs,
        missing = report.missing,
        errors = report.errors,
        "verify complete"
    );
    Ok(report)
}
