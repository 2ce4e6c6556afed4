//! Durable writer behaviour: clean saves, backups, and busy targets.

use std::io;
use std::path::Path;
use std::time::Duration;

use nrf_cmake::script::Script;
use nrf_cmake::writer::{DurableWriter, Rename, Replace, WriteOptions, sibling};

/// Reports the target as busy for the first `busy_for` attempts.
struct LockedFor {
    busy_for: u32,
    calls: u32,
}

impl Replace for LockedFor {
    fn replace(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        self.calls += 1;
        if self.calls <= self.busy_for {
            // The backup must exist while the target is held.
            assert!(sibling(to, ".bak").exists() || !to.exists());
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        Rename.replace(from, to)
    }
}

struct Broken;

impl Replace for Broken {
    fn replace(&mut self, _from: &Path, _to: &Path) -> io::Result<()> {
        Err(io::Error::other("disk on fire"))
    }
}

/// Fails like [`Broken`] after turning the backup into a directory that
/// cannot be removed as a file.
struct BrokenWithPinnedBackup;

impl Replace for BrokenWithPinnedBackup {
    fn replace(&mut self, _from: &Path, to: &Path) -> io::Result<()> {
        let backup = sibling(to, ".bak");
        std::fs::remove_file(&backup).ok();
        std::fs::create_dir_all(backup.join("pinned"))?;
        Err(io::Error::other("disk on fire"))
    }
}

fn options(block: bool) -> WriteOptions {
    WriteOptions {
        block_until_saved: block,
        retry_interval: Duration::from_millis(1),
    }
}

fn script() -> Script {
    let mut script = Script::new(Some("3.7"));
    script.set("PROJECT_NAME", "demo", false);
    script
}

fn assert_no_residue(target: &Path) {
    assert!(!sibling(target, ".tmp").exists(), "temp file left behind");
    assert!(!sibling(target, ".bak").exists(), "backup left behind");
}

#[test]
fn first_attempt_writes_exact_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("CMakeLists.txt");
    let script = script();

    let outcome = DurableWriter::new(options(true)).save(&script, &target).unwrap();
    assert!(outcome.saved);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), script.as_str());
    assert_no_residue(&target);
}

#[test]
fn existing_target_is_replaced_and_backup_removed() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("CMakeLists.txt");
    std::fs::write(&target, "old contents\n").unwrap();

    let outcome = DurableWriter::new(options(true))
        .save_str("new contents\n", &target)
        .unwrap();
    assert!(outcome.saved);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "new contents\n");
    assert_no_residue(&target);
}

#[test]
fn busy_target_is_retried_until_released() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("CMakeLists.txt");
    std::fs::write(&target, "old\n").unwrap();

    let locked = LockedFor {
        busy_for: 3,
        calls: 0,
    };
    let mut writer = DurableWriter::with_replacer(options(true), locked);
    let outcome = writer.save_str("new\n", &target).unwrap();

    assert!(outcome.saved);
    assert_eq!(outcome.attempts, 4);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "new\n");
    assert_no_residue(&target);
}

#[test]
fn single_attempt_mode_gives_up_without_error() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("CMakeLists.txt");
    std::fs::write(&target, "old\n").unwrap();

    let locked = LockedFor {
        busy_for: u32::MAX,
        calls: 0,
    };
    let mut writer = DurableWriter::with_replacer(options(false), locked);
    let outcome = writer.save_str("new\n", &target).unwrap();

    assert!(!outcome.saved);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "old\n");
    assert_no_residue(&target);
}

#[test]
fn other_io_errors_propagate() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("CMakeLists.txt");

    let err = DurableWriter::with_replacer(options(true), Broken)
        .save_str("x\n", &target)
        .unwrap_err();
    assert!(format!("{err:#}").contains("disk on fire"), "{err:#}");
    assert!(!target.exists());
    assert_no_residue(&target);
}

#[test]
fn missing_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("no/such/dir/CMakeLists.txt");
    let err = DurableWriter::new(options(true))
        .save_str("x\n", &target)
        .unwrap_err();
    assert!(format!("{err:#}").contains("CMakeLists.txt.tmp"), "{err:#}");
}

#[test]
fn replace_error_wins_over_backup_cleanup_error() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("CMakeLists.txt");
    std::fs::write(&target, "old\n").unwrap();

    let err = DurableWriter::with_replacer(options(true), BrokenWithPinnedBackup)
        .save_str("new\n", &target)
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("disk on fire"), "{message}");
    assert!(message.contains("replacing"), "{message}");
    assert!(!sibling(&target, ".tmp").exists());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "old\n");
}

#[cfg(target_os = "linux")]
#[test]
fn failed_temp_write_leaves_no_temp_file() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("CMakeLists.txt");
    let temp = sibling(&target, ".tmp");
    // Writes through this link fail with ENOSPC.
    std::os::unix::fs::symlink("/dev/full", &temp).unwrap();

    let err = DurableWriter::new(options(true))
        .save_str("contents that do not fit\n", &target)
        .unwrap_err();
    assert!(format!("{err:#}").contains("writing temporary file"), "{err:#}");
    assert!(std::fs::symlink_metadata(&temp).is_err(), "temp file left behind");
    assert!(!target.exists());
}
