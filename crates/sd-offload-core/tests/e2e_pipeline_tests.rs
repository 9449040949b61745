use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

use chrono::NaiveDateTime;
use sd_offload_core::{
    Action, Error, OffloadConfig, OffloadEngine, SilentReporter, ThresholdConfig, TimestampExtractor,
    UndatedPolicy, Unavailable,
};

/// Reads the capture time from the file body ("YYYY-MM-DD HH:MM:SS"), so
/// tests can fabricate photos without real EXIF blocks.
struct ContentClock;

impl TimestampExtractor for ContentClock {
    fn capture_time(&self, file: &mut File) -> Result<NaiveDateTime, Unavailable> {
        let mut body = String::new();
        file.read_to_string(&mut body)
            .map_err(Unavailable::Unreadable)?;
        NaiveDateTime::parse_from_str(body.trim(), "%Y-%m-%d %H:%M:%S")
            .map_err(|err| Unavailable::Decode(err.to_string()))
    }
}

fn snapshot(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    paths.sort();
    paths
}

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

/// Card layout (content = capture time):
///   DSC001.ARW, DSC002.ARW   2026-01-01
///   DSC003.ARW, DSC004.arw   2026-01-02   -> event with the 1st
///   DSC005.ARW               2026-01-10   -> root
///   DSC006..008.ARW          2026-02-01   -> own day folder
///   DSC009.ARW               (garbage)    -> undated
///   DSC001.JPG, DSC005.JPG   previews
fn create_card(card: &Path) {
    fs::create_dir_all(card).unwrap();
    let photos = [
        ("DSC001.ARW", "2026-01-01 09:00:00"),
        ("DSC002.ARW", "2026-01-01 17:30:00"),
        ("DSC003.ARW", "2026-01-02 08:15:00"),
        ("DSC004.arw", "2026-01-02 22:10:00"),
        ("DSC005.ARW", "2026-01-10 12:00:00"),
        ("DSC006.ARW", "2026-02-01 10:00:00"),
        ("DSC007.ARW", "2026-02-01 10:00:01"),
        ("DSC008.ARW", "2026-02-01 10:00:02"),
        ("DSC009.ARW", "garbage"),
        ("DSC001.JPG", "2026-01-01 09:00:00"),
        ("DSC005.JPG", "2026-01-10 12:00:00"),
    ];
    for (name, content) in photos {
        fs::write(card.join(name), content).unwrap();
    }
}

fn test_config(card: &Path, archive: &Path) -> OffloadConfig {
    let mut config = OffloadConfig::new(card, archive);
    config.thresholds = ThresholdConfig::new(3, 2);
    config.concurrency = 4;
    config.validate().unwrap();
    config
}

#[test]
fn test_full_offload_pipeline() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("archive");
    create_card(&card);

    // Left over from an earlier import: one edit is still backed by its raw
    // file, the other lost it.
    let old = archive.join("20251224");
    fs::create_dir_all(&old).unwrap();
    fs::write(old.join("XMAS1.ARW"), "raw").unwrap();
    fs::write(old.join("XMAS1.xmp"), "edit").unwrap();
    fs::write(old.join("XMAS2.xmp"), "edit").unwrap();

    let engine = OffloadEngine::new(test_config(&card, &archive));
    let summary = engine.run(&ContentClock, &SilentReporter).unwrap();

    assert!(summary.errors.is_empty(), "{}", summary.errors);
    assert_eq!(summary.copied, 9);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.undated, 1);
    assert_eq!(summary.removed_sources, 9);
    assert_eq!(summary.deleted_sidecars, 1);
    assert_eq!(summary.removed(), 10);

    assert_eq!(
        snapshot(&archive),
        paths(&[
            "20251224/XMAS1.ARW",
            "20251224/XMAS1.xmp",
            "20260101-20260102/DSC001.ARW",
            "20260101-20260102/DSC002.ARW",
            "20260101-20260102/DSC003.ARW",
            "20260101-20260102/DSC004.arw",
            "20260201/DSC006.ARW",
            "20260201/DSC007.ARW",
            "20260201/DSC008.ARW",
            "DSC005.ARW",
            "DSC009.ARW",
        ])
    );
    assert_eq!(
        fs::read_to_string(archive.join("20260201/DSC007.ARW")).unwrap(),
        "2026-02-01 10:00:01"
    );

    // Previews are kept by default: untouched on the card.
    assert_eq!(snapshot(&card), paths(&["DSC001.JPG", "DSC005.JPG"]));
}

#[test]
fn test_dry_run_changes_nothing() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("archive");
    create_card(&card);
    let before = snapshot(&card);

    let mut config = test_config(&card, &archive);
    config.dry_run = true;
    let engine = OffloadEngine::new(config);

    let first = engine.run(&ContentClock, &SilentReporter).unwrap();
    let second = engine.run(&ContentClock, &SilentReporter).unwrap();

    assert_eq!(first.copied, 9);
    assert_eq!(second.copied, first.copied);
    assert_eq!(first.removed(), 0);
    assert!(!archive.exists(), "dry run must not create the destination");
    assert_eq!(snapshot(&card), before);
}

#[test]
fn test_previews_go_to_preview_destination() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("raw");
    let previews = tmp.path().join("jpg");
    create_card(&card);

    let mut config = test_config(&card, &archive);
    config.keep_previews = false;
    config.preview_destination_dir = Some(previews.clone());
    let summary = OffloadEngine::new(config)
        .run(&ContentClock, &SilentReporter)
        .unwrap();

    assert!(summary.errors.is_empty(), "{}", summary.errors);
    assert_eq!(summary.copied, 11);
    assert_eq!(summary.removed_sources, 11);
    assert_eq!(snapshot(&previews), paths(&["DSC001.JPG", "DSC005.JPG"]));
    assert!(snapshot(&card).is_empty());
}

#[test]
fn test_undated_skip_policy_leaves_files_on_card() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("archive");
    create_card(&card);

    let mut config = test_config(&card, &archive);
    config.undated = UndatedPolicy::Skip;
    let summary = OffloadEngine::new(config)
        .run(&ContentClock, &SilentReporter)
        .unwrap();

    assert_eq!(summary.undated, 1);
    assert_eq!(summary.copied, 8);
    assert_eq!(summary.removed_sources, 8);
    assert!(!archive.join("DSC009.ARW").exists());
    assert_eq!(
        snapshot(&card),
        paths(&["DSC001.JPG", "DSC005.JPG", "DSC009.ARW"])
    );
}

#[test]
fn test_already_archived_files_are_skipped_and_removed() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("archive");
    create_card(&card);
    fs::create_dir_all(&archive).unwrap();
    fs::write(archive.join("DSC005.ARW"), "archived earlier").unwrap();

    let summary = OffloadEngine::new(test_config(&card, &archive))
        .run(&ContentClock, &SilentReporter)
        .unwrap();

    assert_eq!(summary.copied, 8);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.removed_sources, 9);
    assert_eq!(
        fs::read_to_string(archive.join("DSC005.ARW")).unwrap(),
        "archived earlier"
    );
}

#[test]
fn test_failed_copy_stays_on_card() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("archive");
    create_card(&card);
    // A directory squatting on the destination name makes the copy fail.
    fs::create_dir_all(archive.join("DSC005.ARW")).unwrap();

    let mut config = test_config(&card, &archive);
    config.overwrite = true;
    let summary = OffloadEngine::new(config)
        .run(&ContentClock, &SilentReporter)
        .unwrap();

    assert_eq!(summary.copied, 8);
    assert_eq!(summary.errors.len(), 1);
    let failure = summary.errors.iter().next().unwrap();
    assert_eq!(failure.action, Action::Copy);
    assert!(failure.path.ends_with("DSC005.ARW"));

    assert_eq!(summary.removed_sources, 8);
    assert!(card.join("DSC005.ARW").exists());
}

#[test]
fn test_run_without_destination_is_rejected() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    create_card(&card);

    let config = test_config(&card, Path::new(""));
    let engine = OffloadEngine::new(config);

    let result = engine.run(&ContentClock, &SilentReporter);

    assert!(matches!(result, Err(Error::InvalidConfig(_))));
    assert_eq!(fs::read_dir(&card).unwrap().count(), 11);
}

#[test]
fn test_default_preview_destination_sits_next_to_archive() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("raw");
    let previews = tmp.path().join("jpg");
    create_card(&card);
    fs::create_dir_all(&previews).unwrap();
    fs::write(previews.join("old.jpg"), "preview").unwrap();
    fs::write(previews.join("old.xmp"), "edit").unwrap();

    let mut config = test_config(&card, &archive);
    config.keep_previews = false;
    let summary = OffloadEngine::new(config)
        .run(&ContentClock, &SilentReporter)
        .unwrap();

    assert!(summary.errors.is_empty(), "{}", summary.errors);
    assert_eq!(summary.deleted_sidecars, 0);
    assert_eq!(
        snapshot(&previews),
        paths(&["DSC001.JPG", "DSC005.JPG", "old.jpg", "old.xmp"])
    );
    assert!(!archive.join("jpg").exists());
}

#[test]
fn test_nested_preview_destination_keeps_preview_edits() {
    let tmp = tempdir().unwrap();
    let card = tmp.path().join("card");
    let archive = tmp.path().join("archive");
    let previews = archive.join("jpg");
    create_card(&card);
    fs::create_dir_all(&previews).unwrap();
    fs::write(previews.join("old.jpg"), "preview").unwrap();
    fs::write(previews.join("old.xmp"), "edit").unwrap();
    fs::write(archive.join("lost.xmp"), "edit").unwrap();

    let mut config = test_config(&card, &archive);
    config.keep_previews = false;
    config.preview_destination_dir = Some(previews.clone());
    let summary = OffloadEngine::new(config)
        .run(&ContentClock, &SilentReporter)
        .unwrap();

    assert!(summary.errors.is_empty(), "{}", summary.errors);
    assert_eq!(summary.deleted_sidecars, 1);
    assert!(!archive.join("lost.xmp").exists());
    assert!(previews.join("old.xmp").exists());
    assert!(previews.join("DSC001.JPG").exists());
}
