use crate::error::Error;
use crate::plan::FileRecord;
use crate::timestamp::{TimestampExtractor, Unavailable};
use rayon::iter::Either;
use rayon::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, warn};

/// Files of one extension found in the source directory.
#[derive(Debug, Default)]
pub struct SourceScan {
    pub records: Vec<FileRecord>,
    /// Names whose capture time could not be determined.
    pub undated: Vec<String>,
}

impl SourceScan {
    pub fn len(&self) -> usize {
        self.records.len() + self.undated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.undated.is_empty()
    }
}

/// Case-insensitive extension check; `extension` has no leading dot.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// List `dir` (non-recursively) and extract a capture time for every regular
/// file with `extension`. Extraction runs on the current rayon pool.
pub fn scan_source(
    dir: &Path,
    extension: &str,
    extractor: &dyn TimestampExtractor,
) -> Result<SourceScan, Error> {
    let read_dir_err = |source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let file_type = entry.file_type().map_err(read_dir_err)?;
        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        if !has_extension(&path, extension) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => warn!("Skipping non UTF-8 file name {:?}", name),
        }
    }

    let (records, undated): (Vec<FileRecord>, Vec<String>) =
        names.into_par_iter().partition_map(|name| {
            match read_capture_time(&dir.join(&name), extractor) {
                Ok(capture_time) => {
                    debug!("{} captured at {}", name, capture_time);
                    Either::Left(FileRecord::new(name, capture_time))
                }
                Err(reason) => {
                    warn!("No capture time for {}: {}", name, reason);
                    Either::Right(name)
                }
            }
        });

    Ok(SourceScan { records, undated })
}

fn read_capture_time(
    path: &Path,
    extractor: &dyn TimestampExtractor,
) -> Result<chrono::NaiveDateTime, Unavailable> {
    let mut file = File::open(path).map_err(Unavailable::Unreadable)?;
    extractor.capture_time(&mut file)
}
