pub mod cleanup;
pub mod copy;

pub use cleanup::{remove_sources, RemovalOutcome};
pub use copy::{copy_file, transfer, OverwritePolicy, TransferOutcome};
