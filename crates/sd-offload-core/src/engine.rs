use crate::config::{OffloadConfig, UndatedPolicy};
use crate::error::{BatchError, Error};
use crate::plan::{self, Cluster, Destination};
use crate::progress::ProgressReporter;
use crate::scanner;
use crate::sidecar;
use crate::timestamp::TimestampExtractor;
use crate::transfer;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

pub struct OffloadEngine {
    config: OffloadConfig,
}

/// Totals of one run. `errors` holds every per-item failure of every step;
/// the counts say how much succeeded regardless.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub copied: usize,
    pub skipped: usize,
    pub undated: usize,
    pub removed_sources: usize,
    pub deleted_sidecars: usize,
    pub errors: BatchError,
}

impl RunSummary {
    /// Source files removed plus zombie sidecars deleted.
    pub fn removed(&self) -> usize {
        self.removed_sources + self.deleted_sidecars
    }
}

impl OffloadEngine {
    pub fn new(config: OffloadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    /// Run the full offload:
    /// 1. One transfer pass per primary extension into the destination
    /// 2. Preview passes into the preview destination, unless previews are kept
    /// 3. Remove every settled file from the source
    /// 4. Delete zombie sidecars in the destination
    ///
    /// Steps 3 and 4 never run in dry-run mode.
    pub fn run(
        &self,
        extractor: &dyn TimestampExtractor,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunSummary, Error> {
        let pool = self.build_pool()?;
        pool.install(|| self.run_inner(extractor, reporter))
    }

    /// Sidecar cleanup on its own, outside of a full run.
    pub fn clean_sidecars(&self, dir: &Path, recursive: bool) -> Result<RunSummary, Error> {
        let pool = self.build_pool()?;
        pool.install(|| -> Result<RunSummary, Error> {
            let mut summary = RunSummary::default();
            let excluded = self.nested_preview_dirs(dir);
            for sidecar_extension in &self.config.extensions.sidecar {
                let outcome = sidecar::clean_sidecars_excluding(
                    dir,
                    sidecar_extension,
                    &self.config.extensions.primary,
                    recursive,
                    &excluded,
                )?;
                summary.deleted_sidecars += outcome.deleted;
                summary.errors.absorb(outcome.errors);
            }
            Ok(summary)
        })
    }

    /// The preview destination, when it lies below `root`. Sidecars in there
    /// belong to previews, so the zombie walk must not enter it.
    fn nested_preview_dirs(&self, root: &Path) -> Vec<PathBuf> {
        Some(self.config.preview_destination())
            .filter(|preview| preview != root && preview.starts_with(root))
            .into_iter()
            .collect()
    }

    fn build_pool(&self) -> Result<ThreadPool, Error> {
        Ok(ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency)
            .thread_name(|i| format!("offload-{}", i))
            .build()?)
    }

    fn run_inner(
        &self,
        extractor: &dyn TimestampExtractor,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunSummary, Error> {
        let config = &self.config;
        config.validate_paths()?;
        if config.dry_run {
            info!("Running in Dry-Run mode. No files will be modified.");
        }
        if config.overwrite {
            info!("Running in Overwrite mode. Existing files in destination will be overwritten.");
        } else {
            info!("Running in Skip-Existing mode. Existing files in destination will be skipped.");
        }

        let mut summary = RunSummary::default();
        let mut settled: Vec<String> = Vec::new();

        ensure_dir(&config.destination_dir, config.dry_run)?;
        for extension in &config.extensions.primary {
            settled.extend(self.run_pass(
                extension,
                &config.destination_dir,
                extractor,
                reporter,
                &mut summary,
            )?);
        }

        if !config.keep_previews {
            let preview_destination = config.preview_destination();
            ensure_dir(&preview_destination, config.dry_run)?;
            for extension in &config.extensions.preview {
                settled.extend(self.run_pass(
                    extension,
                    &preview_destination,
                    extractor,
                    reporter,
                    &mut summary,
                )?);
            }
        }

        if config.dry_run {
            return Ok(summary);
        }

        info!("Removing {} transferred files from source...", settled.len());
        let removal = transfer::remove_sources(&config.source_dir, &settled);
        reporter.on_source_cleanup_complete(removal.removed);
        summary.removed_sources = removal.removed;
        summary.errors.absorb(removal.errors);

        if config.delete_zombie_sidecars {
            let excluded = self.nested_preview_dirs(&config.destination_dir);
            for sidecar_extension in &config.extensions.sidecar {
                let outcome = sidecar::clean_sidecars_excluding(
                    &config.destination_dir,
                    sidecar_extension,
                    &config.extensions.primary,
                    config.recursive_sidecar_cleanup,
                    &excluded,
                )?;
                summary.deleted_sidecars += outcome.deleted;
                summary.errors.absorb(outcome.errors);
            }
            reporter.on_sidecar_cleanup_complete(summary.deleted_sidecars);
        }

        Ok(summary)
    }

    /// Scan, cluster and transfer one extension. Returns the settled names.
    fn run_pass(
        &self,
        extension: &str,
        destination_root: &Path,
        extractor: &dyn TimestampExtractor,
        reporter: &dyn ProgressReporter,
        summary: &mut RunSummary,
    ) -> Result<Vec<String>, Error> {
        let config = &self.config;
        let start = Instant::now();

        let scan = scanner::scan_source(&config.source_dir, extension, extractor)?;
        if scan.is_empty() {
            debug!("No .{} files in {}", extension, config.source_dir.display());
            return Ok(Vec::new());
        }
        reporter.on_pass_start(extension, scan.len());

        let buckets = plan::group_by_day(&scan.records);
        let mut clusters = plan::cluster(&buckets, &config.thresholds);
        for cluster in &clusters {
            debug!(
                "{} .{} files -> {}",
                cluster.files.len(),
                extension,
                cluster.destination
            );
        }

        summary.undated += scan.undated.len();
        if !scan.undated.is_empty() {
            match config.undated {
                UndatedPolicy::Root => {
                    info!(
                        "{} .{} files without capture time go to the destination root",
                        scan.undated.len(),
                        extension
                    );
                    clusters.push(Cluster {
                        files: scan.undated,
                        destination: Destination::Root,
                    });
                }
                UndatedPolicy::Skip => {
                    info!(
                        "{} .{} files without capture time are left on the source",
                        scan.undated.len(),
                        extension
                    );
                }
            }
        }

        let outcome = transfer::transfer(
            &config.source_dir,
            destination_root,
            &clusters,
            config.overwrite_policy(),
            config.dry_run,
            reporter,
        )?;

        let duration = start.elapsed();
        info!(
            "Processed .{} files: {} copied, {} skipped, {} failed in {:.2}s",
            extension,
            outcome.copied,
            outcome.skipped,
            outcome.errors.len(),
            duration.as_secs_f64()
        );
        reporter.on_pass_complete(extension, outcome.copied, duration.as_secs_f64());

        summary.copied += outcome.copied;
        summary.skipped += outcome.skipped;
        summary.errors.absorb(outcome.errors);

        Ok(outcome.settled)
    }
}

fn ensure_dir(dir: &Path, dry_run: bool) -> Result<(), Error> {
    if dry_run {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
