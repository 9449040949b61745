pub mod cluster;
pub mod day;

pub use cluster::{cluster, Cluster, Destination};
pub use day::{group_by_day, is_next_day, DayBucket, FileRecord};
