pub mod source;

pub use source::{has_extension, scan_source, SourceScan};
