use crate::error::{Action, BatchError, Error, ItemError};
use crate::plan::{Cluster, Destination};
use crate::progress::ProgressReporter;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Leave an existing destination file alone.
    Skip,
    Overwrite,
}

/// Result of one transfer pass. `errors` lists the files that failed;
/// `copied` counts the ones that did not (or would not, when simulating).
#[derive(Debug, Default)]
pub struct TransferOutcome {
    pub copied: usize,
    pub skipped: usize,
    /// Names now present at the destination, safe to remove from the source.
    pub settled: Vec<String>,
    pub errors: BatchError,
}

enum FileAction {
    Copied,
    Simulated,
    Skipped,
}

struct Job<'a> {
    name: &'a str,
    destination_dir: PathBuf,
}

/// Copy every cluster's files from `source_dir` into its folder under
/// `destination_root`.
///
/// Folders are created first; a folder that cannot be created is fatal and
/// no copy starts. Files are then copied concurrently on the current rayon
/// pool. A failed file never stops its siblings; all failures come back
/// together in `TransferOutcome::errors` once every copy has finished.
pub fn transfer(
    source_dir: &Path,
    destination_root: &Path,
    clusters: &[Cluster],
    policy: OverwritePolicy,
    simulate: bool,
    reporter: &dyn ProgressReporter,
) -> Result<TransferOutcome, Error> {
    let mut jobs: Vec<Job> = Vec::new();

    for cluster in clusters {
        let destination_dir = cluster.destination.resolve(destination_root);
        if !simulate && cluster.destination != Destination::Root {
            fs::create_dir_all(&destination_dir).map_err(|source| Error::CreateDir {
                path: destination_dir.clone(),
                source,
            })?;
        }

        jobs.extend(cluster.files.iter().map(|name| Job {
            name: name.as_str(),
            destination_dir: destination_dir.clone(),
        }));
    }

    let results: Vec<(&str, Result<FileAction, ItemError>)> = jobs
        .par_iter()
        .map(|job| {
            let result = transfer_one(source_dir, job, policy, simulate);
            reporter.on_file_transferred(job.name);
            (job.name, result)
        })
        .collect();

    let mut outcome = TransferOutcome::default();
    for (name, result) in results {
        match result {
            Ok(FileAction::Copied) => {
                outcome.copied += 1;
                outcome.settled.push(name.to_string());
            }
            Ok(FileAction::Simulated) => outcome.copied += 1,
            Ok(FileAction::Skipped) => {
                outcome.skipped += 1;
                outcome.settled.push(name.to_string());
            }
            Err(err) => {
                error!("{}", err);
                outcome.errors.push(err);
            }
        }
    }

    Ok(outcome)
}

fn transfer_one(
    source_dir: &Path,
    job: &Job,
    policy: OverwritePolicy,
    simulate: bool,
) -> Result<FileAction, ItemError> {
    let src = source_dir.join(job.name);
    let dst = job.destination_dir.join(job.name);

    if policy == OverwritePolicy::Skip && occupied(&dst)? {
        info!("Skipping existing file: {}", dst.display());
        return Ok(FileAction::Skipped);
    }

    if simulate {
        info!("[DryRun] Would copy {} to {}", job.name, job.destination_dir.display());
        return Ok(FileAction::Simulated);
    }

    copy_file(&src, &dst).map_err(|source| ItemError::new(Action::Copy, &src, source))?;
    debug!("Copied {} to {}", job.name, job.destination_dir.display());
    Ok(FileAction::Copied)
}

/// Whether something already sits at `dst`. Only NotFound counts as free; any
/// other stat failure is reported instead of being copied over.
fn occupied(dst: &Path) -> Result<bool, ItemError> {
    match fs::symlink_metadata(dst) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ItemError::new(Action::Probe, dst, source)),
    }
}

/// Byte-for-byte stream copy. File metadata is not preserved. On failure the
/// partial destination file is removed.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;

    let copied = io::copy(&mut input, &mut output).and_then(|n| {
        output.sync_all()?;
        Ok(n)
    });

    if copied.is_err() {
        drop(output);
        let _ = fs::remove_file(dst);
    }
    copied
}
