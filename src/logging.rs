use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,sd_offload=info,sd_offload_core=info";
const DEFAULT_LOG_FILE: &str = "./logs/sd-offload.log";

/// Where the log file goes, if anywhere.
pub struct LogTarget {
    pub file: Option<PathBuf>,
    /// A dry run writes nothing to disk, the log file included.
    pub dry_run: bool,
}

impl LogTarget {
    fn file_path(&self) -> Option<PathBuf> {
        if self.dry_run {
            return None;
        }
        self.file.clone().or_else(|| {
            Some(PathBuf::from(
                env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()),
            ))
        })
    }
}

/// Stdout always; the file layer only when `target` resolves to a path. Keep
/// the returned guard alive until exit so buffered lines are flushed.
pub fn init_logger(target: &LogTarget) -> Option<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let filter_layer = EnvFilter::new(filter);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time()
        .with_ansi(true);

    let (file_layer, guard) = match target.file_path() {
        Some(path) => {
            let (dir, name) = split_log_path(&path);
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_thread_names(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(filter_layer)
        .init();

    match target.file_path() {
        Some(path) => debug!("Logging to stdout and {}", path.display()),
        None => debug!("Dry run: logging to stdout only"),
    }

    guard
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sd-offload.log"));
    (dir, name)
}
