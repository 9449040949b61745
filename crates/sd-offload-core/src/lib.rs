pub mod config;
pub mod engine;
pub mod error;
pub mod plan;
pub mod progress;
pub mod scanner;
pub mod sidecar;
pub mod timestamp;
pub mod transfer;

pub use config::{OffloadConfig, ThresholdConfig, UndatedPolicy};
pub use engine::{OffloadEngine, RunSummary};
pub use error::{Action, BatchError, Error, ItemError};
pub use progress::{ProgressReporter, SilentReporter};
pub use timestamp::{ExifExtractor, TimestampExtractor, Unavailable};
