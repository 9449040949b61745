/// Trait for reporting offload progress.
///
/// The CLI implements it with indicatif bars. Hooks may be called from any
/// worker thread. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_pass_start(&self, _extension: &str, _total_files: usize) {}
    fn on_file_transferred(&self, _name: &str) {}
    fn on_pass_complete(&self, _extension: &str, _copied: usize, _duration_secs: f64) {}
    fn on_source_cleanup_complete(&self, _removed: usize) {}
    fn on_sidecar_cleanup_complete(&self, _deleted: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
