use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};

/// Why a file produced no capture time. Callers treat every variant the
/// same way: the file is left out of clustering.
#[derive(Debug)]
pub enum Unavailable {
    MissingTag,
    Unreadable(io::Error),
    Decode(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::MissingTag => f.write_str("no capture date tag"),
            Unavailable::Unreadable(err) => write!(f, "unreadable metadata: {}", err),
            Unavailable::Decode(msg) => write!(f, "metadata decode failed: {}", msg),
        }
    }
}

impl std::error::Error for Unavailable {}

/// Source of capture timestamps. Called concurrently from the worker pool.
pub trait TimestampExtractor: Send + Sync {
    fn capture_time(&self, file: &mut File) -> Result<NaiveDateTime, Unavailable>;
}

/// Reads `DateTimeOriginal` (falling back to `DateTime`) from the EXIF block.
/// The wall-clock value is taken as-is, without timezone conversion.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifExtractor;

impl TimestampExtractor for ExifExtractor {
    fn capture_time(&self, file: &mut File) -> Result<NaiveDateTime, Unavailable> {
        let mut reader = BufReader::new(file);
        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|err| match err {
                exif::Error::Io(io_err) => Unavailable::Unreadable(io_err),
                other => Unavailable::Decode(other.to_string()),
            })?;

        let field = [Tag::DateTimeOriginal, Tag::DateTime]
            .iter()
            .find_map(|tag| exif.get_field(*tag, In::PRIMARY))
            .ok_or(Unavailable::MissingTag)?;

        match field.value {
            Value::Ascii(ref parts) if !parts.is_empty() => {
                let datetime = exif::DateTime::from_ascii(&parts[0])
                    .map_err(|err| Unavailable::Decode(err.to_string()))?;
                to_naive(&datetime).ok_or_else(|| {
                    Unavailable::Decode(format!("out of range date {}", datetime))
                })
            }
            _ => Err(Unavailable::MissingTag),
        }
    }
}

fn to_naive(datetime: &exif::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        datetime.year.into(),
        datetime.month.into(),
        datetime.day.into(),
    )?
    .and_hms_opt(
        datetime.hour.into(),
        datetime.minute.into(),
        datetime.second.into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, Write};

    #[test]
    fn test_to_naive_from_exif_ascii() {
        let datetime = exif::DateTime::from_ascii(b"2026:01:15 18:45:03").unwrap();
        let naive = to_naive(&datetime).unwrap();
        assert_eq!(naive.to_string(), "2026-01-15 18:45:03");
    }

    #[test]
    fn test_non_image_file_is_unavailable() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"definitely not a tiff container").unwrap();
        file.rewind().unwrap();

        assert!(ExifExtractor.capture_time(&mut file).is_err());
    }
}
