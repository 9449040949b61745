use crate::error::{Action, BatchError, Error, ItemError};
use crate::scanner::has_extension;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Default)]
pub struct SidecarOutcome {
    pub deleted: usize,
    pub errors: BatchError,
}

impl SidecarOutcome {
    fn deleted_one() -> Self {
        Self {
            deleted: 1,
            ..Default::default()
        }
    }

    fn failed(err: ItemError) -> Self {
        error!("{}", err);
        let mut outcome = Self::default();
        outcome.errors.push(err);
        outcome
    }

    fn merge(mut self, other: Self) -> Self {
        self.deleted += other.deleted;
        self.errors.absorb(other.errors);
        self
    }
}

struct Entry {
    path: PathBuf,
    is_dir: bool,
}

/// Delete "zombie" sidecars under `dir`: files with `sidecar_extension` for
/// which no `<stem>.<ext>` exists in the same directory for any of
/// `primary_extensions`. Extensions match case-insensitively.
///
/// Only a failure to list `dir` itself is fatal. Sub-directories that cannot
/// be listed, failed primary checks and failed deletions are collected into the
/// outcome. Every subtree is finished before this returns.
pub fn clean_sidecars(
    dir: &Path,
    sidecar_extension: &str,
    primary_extensions: &[String],
    recursive: bool,
) -> Result<SidecarOutcome, Error> {
    clean_sidecars_excluding(dir, sidecar_extension, primary_extensions, recursive, &[])
}

/// Like [`clean_sidecars`], but never descends into any of `excluded`.
///
/// Used to keep a preview tree nested in the destination out of the walk:
/// its sidecars belong to preview files, not to primaries.
pub fn clean_sidecars_excluding(
    dir: &Path,
    sidecar_extension: &str,
    primary_extensions: &[String],
    recursive: bool,
    excluded: &[PathBuf],
) -> Result<SidecarOutcome, Error> {
    let walk = Walk {
        sidecar_extension,
        primary_extensions,
        recursive,
        excluded,
    };
    walk.clean_dir(dir).map_err(|source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    })
}

struct Walk<'a> {
    sidecar_extension: &'a str,
    primary_extensions: &'a [String],
    recursive: bool,
    excluded: &'a [PathBuf],
}

impl Walk<'_> {
    fn clean_dir(&self, dir: &Path) -> io::Result<SidecarOutcome> {
        let mut entries: Vec<Entry> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            entries.push(Entry {
                path: entry.path(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }

        // Lowercased file name -> path, for case-insensitive sibling lookup.
        let siblings: HashMap<String, &Path> = entries
            .iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| {
                let name = entry.path.file_name()?.to_string_lossy().to_lowercase();
                Some((name, entry.path.as_path()))
            })
            .collect();

        let outcome = entries
            .par_iter()
            .map(|entry| {
                if entry.is_dir {
                    return self.clean_subdir(&entry.path);
                }
                clean_entry(
                    &entry.path,
                    &siblings,
                    self.sidecar_extension,
                    self.primary_extensions,
                )
            })
            .reduce(SidecarOutcome::default, SidecarOutcome::merge);

        Ok(outcome)
    }

    fn clean_subdir(&self, dir: &Path) -> SidecarOutcome {
        if !self.recursive {
            return SidecarOutcome::default();
        }
        if self.excluded.iter().any(|excluded| excluded == dir) {
            debug!("Not descending into excluded directory {}", dir.display());
            return SidecarOutcome::default();
        }
        match self.clean_dir(dir) {
            Ok(outcome) => outcome,
            Err(source) => {
                SidecarOutcome::failed(ItemError::new(Action::ReadDirectory, dir, source))
            }
        }
    }
}

fn clean_entry(
    path: &Path,
    siblings: &HashMap<String, &Path>,
    sidecar_extension: &str,
    primary_extensions: &[String],
) -> SidecarOutcome {
    if !has_extension(path, sidecar_extension) {
        return SidecarOutcome::default();
    }

    let stem = match path.file_stem() {
        Some(stem) => stem.to_string_lossy(),
        None => return SidecarOutcome::default(),
    };

    for extension in primary_extensions {
        let candidate = format!("{}.{}", stem, extension).to_lowercase();
        let Some(primary) = siblings.get(&candidate) else {
            continue;
        };

        match fs::metadata(primary) {
            Ok(_) => {
                debug!("Keeping {}: found {}", path.display(), primary.display());
                return SidecarOutcome::default();
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => {
                return SidecarOutcome::failed(ItemError::new(Action::Probe, *primary, source));
            }
        }
    }

    match fs::remove_file(path) {
        Ok(()) => {
            info!("Removed zombie sidecar file: {}", path.display());
            SidecarOutcome::deleted_one()
        }
        Err(source) => SidecarOutcome::failed(ItemError::new(Action::DeleteSidecar, path, source)),
    }
}
