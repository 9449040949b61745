use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Anything returned as `Err(Error)` aborted the operation
/// before (or instead of) starting its concurrent work.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("reading directory {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("creating directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("building worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Copy,
    RemoveSource,
    Probe,
    DeleteSidecar,
    ReadDirectory,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Copy => "copying",
            Action::RemoveSource => "removing source file",
            Action::Probe => "checking",
            Action::DeleteSidecar => "removing zombie sidecar",
            Action::ReadDirectory => "processing subdirectory",
        };
        f.write_str(verb)
    }
}

/// A single failed per-item operation inside a batch.
#[derive(Error, Debug)]
#[error("{action} {}: {source}", .path.display())]
pub struct ItemError {
    pub path: PathBuf,
    pub action: Action,
    pub source: io::Error,
}

impl ItemError {
    pub fn new(action: Action, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            action,
            source,
        }
    }
}

/// Every per-item failure of a batch, joined once all producers finished.
///
/// An empty `BatchError` means the whole batch succeeded. A non-empty one
/// means some subset failed; the accompanying count says how much succeeded.
#[derive(Debug, Default)]
pub struct BatchError {
    failures: Vec<ItemError>,
}

impl BatchError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn push(&mut self, failure: ItemError) {
        self.failures.push(failure);
    }

    /// Fold another batch's failures into this one.
    pub fn absorb(&mut self, other: BatchError) {
        self.failures.extend(other.failures);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemError> {
        self.failures.iter()
    }

    pub fn into_result(self) -> Result<(), BatchError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl FromIterator<ItemError> for BatchError {
    fn from_iter<I: IntoIterator<Item = ItemError>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BatchError {
    type Item = ItemError;
    type IntoIter = std::vec::IntoIter<ItemError>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(path: &str, action: Action) -> ItemError {
        ItemError::new(
            action,
            path,
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        )
    }

    #[test]
    fn test_empty_batch_is_ok() {
        let batch = BatchError::new();
        assert!(batch.is_empty());
        assert!(batch.into_result().is_ok());
    }

    #[test]
    fn test_batch_display_joins_lines() {
        let batch: BatchError = vec![
            not_found("a.arw", Action::Copy),
            not_found("b.xmp", Action::DeleteSidecar),
        ]
        .into_iter()
        .collect();

        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.to_string(),
            "copying a.arw: no such file\nremoving zombie sidecar b.xmp: no such file"
        );
    }

    #[test]
    fn test_absorb_keeps_all_failures() {
        let mut parent: BatchError = vec![not_found("a", Action::Probe)].into_iter().collect();
        let child: BatchError = vec![
            not_found("sub/b", Action::DeleteSidecar),
            not_found("sub/c", Action::DeleteSidecar),
        ]
        .into_iter()
        .collect();

        parent.absorb(child);

        assert_eq!(parent.len(), 3);
        assert!(parent.into_result().is_err());
    }
}
