use bkrun::capability::BuiltinZip;
use bkrun::naming::Clock;
use bkrun::{Action, BackupItemConfig, ConfigError, GlobalDefaults, Orchestrator, Outcome, Password};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct March5th;

impl Clock for March5th {
    fn now(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 7, 2)
            .unwrap()
    }
}

fn setup() -> (TempDir, PathBuf, GlobalDefaults) {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("Documents");
    fs::create_dir_all(src.join("letters")).unwrap();
    fs::write(src.join("letters").join("one.txt"), "dear reader").unwrap();
    let defaults = GlobalDefaults {
        default_backup_path: temp.path().join("backups"),
        default_password: Password::new("very-secret"),
    };
    (temp, src, defaults)
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(Box::new(BuiltinZip)).with_clock(Box::new(March5th))
}

#[test]
fn password_protected_archive() {
    let (temp, src, defaults) = setup();
    let mut item = BackupItemConfig::new("Docs", &src);
    item.dest_path = Some(temp.path().join("ignored"));
    item.use_default_path = true;
    item.should_zip = true;
    item.is_password_protected = true;
    item.use_default_password = true;
    item.compression_level = 9;

    let results = orchestrator().run(&[item], &defaults).unwrap();
    assert_eq!(results.len(), 1);
    let res = &results[0];
    assert!(matches!(res.outcome, Outcome::Success));
    assert_eq!(res.action, Action::Archive);
    assert!(res.summary.contains("password protection"));
    assert!(!res.summary.contains("very-secret"));

    let archive = temp
        .path()
        .join("backups")
        .join("Docs-2024-03-05-09-07-02")
        .join("Docs-2024-03-05-09-07-02.zip");
    assert!(archive.is_file());
    assert!(!temp.path().join("ignored").exists());

    let mut zip = zip::ZipArchive::new(fs::File::open(&archive).unwrap()).unwrap();
    assert!(zip.by_name("Documents/letters/one.txt").is_err());
    assert!(
        zip.by_name_decrypt("Documents/letters/one.txt", b"very-secret")
            .is_ok()
    );
}

#[test]
fn plain_copy_has_no_archive() {
    let (temp, src, defaults) = setup();
    let mut item = BackupItemConfig::new("Docs", &src);
    item.dest_path = Some(temp.path().join("usb"));

    let results = orchestrator().run(&[item], &defaults).unwrap();
    let res = &results[0];
    assert!(res.is_success());
    assert!(!res.summary.to_lowercase().contains("zip"));

    let run_dir = temp.path().join("usb").join("Docs-2024-03-05-09-07-02");
    assert_eq!(
        fs::read_to_string(run_dir.join("letters").join("one.txt")).unwrap(),
        "dear reader"
    );
}

#[test]
fn bad_level_fails_only_that_item() {
    let (_temp, src, defaults) = setup();
    let mut first = BackupItemConfig::new("First", &src);
    first.use_default_path = true;
    first.should_zip = true;
    first.compression_level = 99;
    let mut second = BackupItemConfig::new("Second", &src);
    second.use_default_path = true;
    second.should_zip = true;

    let results = orchestrator().run(&[first, second], &defaults).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].item_name, "First");
    match &results[0].outcome {
        Outcome::Failure(err) => assert_eq!(err.exit_status(), Some(7)),
        Outcome::Success => panic!("level 99 should be rejected"),
    }
    assert_eq!(results[1].item_name, "Second");
    assert!(results[1].is_success());
}

#[test]
fn empty_item_list() {
    let (_temp, _src, defaults) = setup();
    let err = orchestrator().run(&[], &defaults).unwrap_err();
    assert!(matches!(err, ConfigError::Empty));
}
