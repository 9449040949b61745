use crate::error::{Action, BatchError, ItemError};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

#[derive(Debug, Default)]
pub struct RemovalOutcome {
    pub removed: usize,
    pub errors: BatchError,
}

/// Remove `names` from `source_dir` concurrently. Each failure is recorded
/// and the remaining removals still run.
pub fn remove_sources(source_dir: &Path, names: &[String]) -> RemovalOutcome {
    let failures: Vec<ItemError> = names
        .par_iter()
        .filter_map(|name| {
            let path = source_dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed {}", name);
                    None
                }
                Err(source) => {
                    let err = ItemError::new(Action::RemoveSource, path, source);
                    error!("{}", err);
                    Some(err)
                }
            }
        })
        .collect();
    let errors: BatchError = failures.into_iter().collect();

    RemovalOutcome {
        removed: names.len() - errors.len(),
        errors,
    }
}
