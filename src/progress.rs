use indicatif::{ProgressBar, ProgressStyle};
use sd_offload_core::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress reporter using indicatif progress bars.
///
/// One bar per extension pass; cleanup steps print a single line.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_pass_start(&self, extension: &str, total_files: usize) {
        let pb = ProgressBar::new(total_files as u64);
        let style = ProgressStyle::with_template(
            "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.set_message(format!(".{}", extension));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_file_transferred(&self, _name: &str) {
        let guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.as_ref() {
            pb.inc(1);
        }
    }

    fn on_pass_complete(&self, extension: &str, copied: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m .{}: {} files in {:.2}s",
            extension, copied, duration_secs
        );
    }

    fn on_source_cleanup_complete(&self, removed: usize) {
        eprintln!("  \x1b[32m✓\x1b[0m Source cleanup: {} files removed", removed);
    }

    fn on_sidecar_cleanup_complete(&self, deleted: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Sidecar cleanup: {} zombie files removed",
            deleted
        );
    }
}
