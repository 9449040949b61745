use crate::error::Error;
use crate::transfer::OverwritePolicy;
use ::config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SINGLE_DAY_THRESHOLD: usize = 700;
pub const DEFAULT_CONSECUTIVE_DAYS_THRESHOLD: usize = 300;

/// Volume thresholds used when clustering day buckets into folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ThresholdConfig {
    /// Minimum photos on one day for that day to get its own folder.
    #[serde(default = "default_single_day")]
    pub single_day: usize,
    /// Minimum photos per day for consecutive days to merge into an event folder.
    #[serde(default = "default_consecutive_days")]
    pub consecutive_days: usize,
}

impl ThresholdConfig {
    pub fn new(single_day: usize, consecutive_days: usize) -> Self {
        Self {
            single_day,
            consecutive_days,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SINGLE_DAY_THRESHOLD, DEFAULT_CONSECUTIVE_DAYS_THRESHOLD)
    }
}

/// What happens to files whose capture time cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndatedPolicy {
    /// Copy them into the destination root.
    #[default]
    Root,
    /// Leave them on the source untouched.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_primary")]
    pub primary: Vec<String>,
    #[serde(default = "default_preview")]
    pub preview: Vec<String>,
    #[serde(default = "default_sidecar")]
    pub sidecar: Vec<String>,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            preview: default_preview(),
            sidecar: default_sidecar(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OffloadConfig {
    #[serde(default)]
    pub source_dir: PathBuf,
    #[serde(default)]
    pub destination_dir: PathBuf,
    #[serde(default)]
    pub preview_destination_dir: Option<PathBuf>,
    #[serde(default)]
    pub extensions: ExtensionConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_true")]
    pub keep_previews: bool,
    #[serde(default = "default_true")]
    pub delete_zombie_sidecars: bool,
    #[serde(default = "default_true")]
    pub recursive_sidecar_cleanup: bool,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub undated: UndatedPolicy,
}

impl OffloadConfig {
    /// Configuration with every optional key at its default.
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            preview_destination_dir: None,
            extensions: ExtensionConfig::default(),
            thresholds: ThresholdConfig::default(),
            dry_run: false,
            overwrite: false,
            keep_previews: true,
            delete_zombie_sidecars: true,
            recursive_sidecar_cleanup: true,
            concurrency: default_concurrency(),
            undated: UndatedPolicy::default(),
        }
    }

    /// Defaults to a `jpg` directory next to the destination, never inside it.
    pub fn preview_destination(&self) -> PathBuf {
        self.preview_destination_dir
            .clone()
            .unwrap_or_else(|| self.destination_dir.with_file_name("jpg"))
    }

    pub fn overwrite_policy(&self) -> OverwritePolicy {
        if self.overwrite {
            OverwritePolicy::Overwrite
        } else {
            OverwritePolicy::Skip
        }
    }

    /// Normalise extension lists and reject values the engine cannot run with.
    pub fn validate(&mut self) -> Result<(), Error> {
        self.extensions.primary = normalize_extensions(&self.extensions.primary);
        self.extensions.preview = normalize_extensions(&self.extensions.preview);
        self.extensions.sidecar = normalize_extensions(&self.extensions.sidecar);

        if self.extensions.primary.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one primary extension is required".to_string(),
            ));
        }
        if self.thresholds.single_day == 0 || self.thresholds.consecutive_days == 0 {
            return Err(Error::InvalidConfig(
                "thresholds must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Paths are only needed for a full run, so they are checked separately.
    pub fn validate_paths(&self) -> Result<(), Error> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("source_dir is not set".to_string()));
        }
        if self.destination_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "destination_dir is not set".to_string(),
            ));
        }
        if self.source_dir == self.destination_dir {
            return Err(Error::InvalidConfig(format!(
                "source and destination are the same directory: {}",
                self.source_dir.display()
            )));
        }
        if self.preview_destination() == self.destination_dir {
            return Err(Error::InvalidConfig(format!(
                "preview destination must differ from destination: {}",
                self.destination_dir.display()
            )));
        }
        Ok(())
    }
}

/// Values supplied on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_dir: Option<PathBuf>,
    pub destination_dir: Option<PathBuf>,
    pub preview_destination_dir: Option<PathBuf>,
    pub dry_run: Option<bool>,
    pub overwrite: Option<bool>,
    pub keep_previews: Option<bool>,
    pub delete_zombie_sidecars: Option<bool>,
    pub single_day_threshold: Option<usize>,
    pub consecutive_days_threshold: Option<usize>,
    pub concurrency: Option<usize>,
    pub undated: Option<String>,
}

/// Layered load: `Offload.toml` (or `file`, which is then required), then
/// `OFFLOAD_*` environment variables, then `overrides`.
pub fn load_configuration(
    file: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<OffloadConfig, Error> {
    let file_source = match file {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Offload").required(false),
    };

    let builder = Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix("OFFLOAD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("source_dir", path_value(&overrides.source_dir))?
        .set_override_option("destination_dir", path_value(&overrides.destination_dir))?
        .set_override_option(
            "preview_destination_dir",
            path_value(&overrides.preview_destination_dir),
        )?
        .set_override_option("dry_run", overrides.dry_run)?
        .set_override_option("overwrite", overrides.overwrite)?
        .set_override_option("keep_previews", overrides.keep_previews)?
        .set_override_option("delete_zombie_sidecars", overrides.delete_zombie_sidecars)?
        .set_override_option(
            "thresholds.single_day",
            overrides.single_day_threshold.map(|n| n as i64),
        )?
        .set_override_option(
            "thresholds.consecutive_days",
            overrides.consecutive_days_threshold.map(|n| n as i64),
        )?
        .set_override_option("concurrency", overrides.concurrency.map(|n| n as i64))?
        .set_override_option("undated", overrides.undated.clone())?
        .build()?;

    let mut config = builder.try_deserialize::<OffloadConfig>()?;
    config.validate()?;
    Ok(config)
}

/// Lowercase, strip a leading dot, drop blanks and duplicates (first wins).
pub fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !result.contains(&ext) {
            result.push(ext);
        }
    }
    result
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

fn default_single_day() -> usize {
    DEFAULT_SINGLE_DAY_THRESHOLD
}

fn default_consecutive_days() -> usize {
    DEFAULT_CONSECUTIVE_DAYS_THRESHOLD
}

fn default_primary() -> Vec<String> {
    vec!["arw".to_string(), "raw".to_string()]
}

fn default_preview() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string()]
}

fn default_sidecar() -> Vec<String> {
    vec!["xmp".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}
