use chrono::{NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub capture_time: NaiveDateTime,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, capture_time: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            capture_time,
        }
    }
}

/// Files captured on one calendar day. Order of `files` is not significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub files: Vec<String>,
}

impl DayBucket {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Partition records by calendar date of their capture time, sorted ascending.
pub fn group_by_day(records: &[FileRecord]) -> Vec<DayBucket> {
    let map: DashMap<NaiveDate, Vec<String>> = DashMap::new();

    records.par_iter().for_each(|record| {
        map.entry(record.capture_time.date())
            .or_default()
            .push(record.name.clone());
    });

    let mut buckets: Vec<DayBucket> = map
        .into_iter()
        .map(|(date, files)| DayBucket { date, files })
        .collect();
    buckets.sort_by_key(|bucket| bucket.date);
    buckets
}

/// True when `next` is the calendar day right after `day`.
pub fn is_next_day(day: NaiveDate, next: NaiveDate) -> bool {
    day.succ_opt() == Some(next)
}
