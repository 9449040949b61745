use super::day::{is_next_day, DayBucket};
use crate::config::ThresholdConfig;
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

const FOLDER_DATE_FORMAT: &str = "%Y%m%d";

/// Where a cluster's files land, relative to the destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Root,
    Day(NaiveDate),
    /// Inclusive range of consecutive days (an event).
    Range(NaiveDate, NaiveDate),
}

impl Destination {
    /// `"."`, `"20260115"` or `"20260101-20260102"`.
    pub fn folder_name(&self) -> String {
        match self {
            Destination::Root => ".".to_string(),
            Destination::Day(day) => day.format(FOLDER_DATE_FORMAT).to_string(),
            Destination::Range(first, last) => format!(
                "{}-{}",
                first.format(FOLDER_DATE_FORMAT),
                last.format(FOLDER_DATE_FORMAT)
            ),
        }
    }

    pub fn resolve(&self, root: &Path) -> PathBuf {
        match self {
            Destination::Root => root.to_path_buf(),
            _ => root.join(self.folder_name()),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.folder_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub files: Vec<String>,
    pub destination: Destination,
}

impl Cluster {
    pub fn destination_folder(&self) -> String {
        self.destination.folder_name()
    }
}

/// Assign every bucket to a destination in one greedy left-to-right pass.
///
/// `buckets` must be sorted ascending by date (as `group_by_day` returns
/// them). A run of two or more contiguous days, each holding at least
/// `consecutive_days` files, becomes one range folder. Anything else is
/// judged alone: at least `single_day` files gets a day folder, the rest
/// goes to the root. Both thresholds are inclusive.
pub fn cluster(buckets: &[DayBucket], thresholds: &ThresholdConfig) -> Vec<Cluster> {
    let mut result = Vec::new();

    let mut i = 0;
    while i < buckets.len() {
        let current = &buckets[i];

        if current.len() >= thresholds.consecutive_days {
            let mut end = i + 1;
            while end < buckets.len()
                && is_next_day(buckets[end - 1].date, buckets[end].date)
                && buckets[end].len() >= thresholds.consecutive_days
            {
                end += 1;
            }

            let run = &buckets[i..end];
            if run.len() >= 2 {
                let files = run
                    .iter()
                    .flat_map(|bucket| bucket.files.iter().cloned())
                    .collect();
                result.push(Cluster {
                    files,
                    destination: Destination::Range(run[0].date, run[run.len() - 1].date),
                });
                i = end;
                continue;
            }
        }

        let destination = if current.len() >= thresholds.single_day {
            Destination::Day(current.date)
        } else {
            Destination::Root
        };
        result.push(Cluster {
            files: current.files.clone(),
            destination,
        });
        i += 1;
    }

    result
}
