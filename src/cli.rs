use clap::{Args, Parser, Subcommand};
use sd_offload_core::config::ConfigOverrides;
use std::path::PathBuf;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "sd-offload")]
#[command(about = "Offload photos from an SD card into date folders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub options: Options,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy photos to the archive, empty the card, remove zombie sidecars (default)
    Run,
    /// Print the resolved configuration
    PrintConfig,
    /// Only delete sidecar files without a matching primary file
    CleanSidecars {
        /// Directory to clean
        dir: PathBuf,
        /// Do not descend into subdirectories
        #[arg(long)]
        no_recursive: bool,
    },
}

#[derive(Debug, Args)]
pub struct Options {
    /// Configuration file (defaults to ./Offload.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log file (overrides LOG_FILE_PATH; dry runs never write one)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Source directory on the card
    #[arg(long, global = true)]
    pub src: Option<PathBuf>,

    /// Destination directory for primary (raw) files
    #[arg(long, global = true)]
    pub dst: Option<PathBuf>,

    /// Destination directory for preview (jpg) files
    #[arg(long, global = true)]
    pub dst_preview: Option<PathBuf>,

    /// Simulate operations without modifying files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Overwrite existing files in destination
    #[arg(long, global = true)]
    pub overwrite: bool,

    /// Leave preview files on the card instead of copying them
    #[arg(long, global = true)]
    pub keep_previews: Option<bool>,

    /// Delete sidecar files whose primary file is gone
    #[arg(long, global = true)]
    pub delete_zombie_sidecars: Option<bool>,

    /// Minimum photos on one day to create a folder for that day
    #[arg(long, global = true)]
    pub threshold_one_day: Option<usize>,

    /// Minimum photos per day for consecutive days to share an event folder
    #[arg(long, global = true)]
    pub threshold_consecutive_days: Option<usize>,

    /// Worker threads used for copying and cleanup
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// What to do with files without a capture date: root or skip
    #[arg(long, global = true)]
    pub undated: Option<String>,
}

impl Options {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source_dir: self.src.clone(),
            destination_dir: self.dst.clone(),
            preview_destination_dir: self.dst_preview.clone(),
            dry_run: self.dry_run.then_some(true),
            overwrite: self.overwrite.then_some(true),
            keep_previews: self.keep_previews,
            delete_zombie_sidecars: self.delete_zombie_sidecars,
            single_day_threshold: self.threshold_one_day,
            consecutive_days_threshold: self.threshold_consecutive_days,
            concurrency: self.concurrency,
            undated: self.undated.clone(),
        }
    }
}
