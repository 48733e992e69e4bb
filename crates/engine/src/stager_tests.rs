// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, FsStager) {
    let dir = TempDir::new().unwrap();
    let layout = StageLayout::new(dir.path().join("share/tg"), "rap");
    fs::create_dir_all(layout.root()).unwrap();
    (dir, FsStager::new(layout, "grib2"))
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn promote_replaces_live_and_removes_transient_files() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(&layout.live().join("old.dat"), "old");
    write(&layout.staging().join("a.grib2"), "x");
    write(&layout.staging().join("b.dat"), "new");

    let mut notes = Vec::new();
    let promotion = stager.promote(&mut notes).unwrap();

    assert_eq!(promotion, Promotion { replaced_previous: true, removed_transient: 1 });
    assert_eq!(listing(layout.live()), vec!["b.dat"]);
    assert_eq!(fs::read_to_string(layout.live().join("b.dat")).unwrap(), "new");
    assert!(!layout.staging().exists());
    assert!(!layout.backup().exists());

    let expected_rename = format!(
        "Renaming directory: {} to {}",
        layout.staging().display(),
        layout.live().display()
    );
    assert!(notes.contains(&expected_rename), "notes: {:?}", notes);
    assert!(notes.contains(&format!("Deleting directory: {}", layout.backup().display())));
}

#[test]
fn promote_without_previous_live() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(&layout.staging().join("b.dat"), "new");

    let promotion = stager.promote(&mut Vec::new()).unwrap();

    assert!(!promotion.replaced_previous);
    assert_eq!(listing(layout.live()), vec!["b.dat"]);
}

#[test]
fn promote_fails_and_leaves_live_untouched_when_staging_missing() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(&layout.live().join("old.dat"), "old");

    let mut notes = Vec::new();
    let err = stager.promote(&mut notes).unwrap_err();

    assert!(matches!(err, StageError::StagingMissing(_)));
    assert_eq!(listing(layout.live()), vec!["old.dat"]);
    assert!(!layout.backup().exists());
    assert!(notes.iter().any(|n| n.starts_with("Error: staging directory missing")));
}

#[test]
fn promote_discards_stale_backup() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(&layout.live().join("old.dat"), "old");
    write(&layout.backup().join("ancient.dat"), "ancient");
    write(&layout.staging().join("b.dat"), "new");

    stager.promote(&mut Vec::new()).unwrap();

    assert_eq!(listing(layout.live()), vec!["b.dat"]);
    assert!(!layout.backup().exists());
}

fn refuse_staging_rename(from: &Path, to: &Path) -> io::Result<()> {
    if from.extension().is_some_and(|ext| ext == "new") {
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "rename refused"));
    }
    fs::rename(from, to)
}

fn refuse_backup_removal(path: &Path) -> io::Result<()> {
    if path.extension().is_some_and(|ext| ext == "bak") {
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "remove refused"));
    }
    fs::remove_dir_all(path)
}

#[test]
fn failed_swap_restores_previous_live() {
    let (_dir, stager) = setup();
    let stager = stager.with_rename(refuse_staging_rename);
    let layout = stager.layout().clone();
    write(&layout.live().join("old.dat"), "old");
    write(&layout.staging().join("b.dat"), "new");

    let mut notes = Vec::new();
    let err = stager.promote(&mut notes).unwrap_err();

    assert!(matches!(err, StageError::Io { op: "rename", .. }), "{err}");
    assert_eq!(listing(layout.live()), vec!["old.dat"]);
    assert_eq!(listing(layout.staging()), vec!["b.dat"]);
    assert!(!layout.backup().exists());
    let restore = format!(
        "Restoring directory: {} to {}",
        layout.backup().display(),
        layout.live().display()
    );
    assert!(notes.contains(&restore), "notes: {:?}", notes);
    assert!(notes.iter().any(|n| n.starts_with("Error: failed to rename")));
}

#[test]
fn failed_stale_backup_removal_is_noted_and_keeps_live() {
    let (_dir, stager) = setup();
    let stager = stager.with_remove_tree(refuse_backup_removal);
    let layout = stager.layout().clone();
    write(&layout.live().join("old.dat"), "old");
    write(&layout.backup().join("ancient.dat"), "ancient");
    write(&layout.staging().join("b.dat"), "new");

    let mut notes = Vec::new();
    let err = stager.promote(&mut notes).unwrap_err();

    assert!(matches!(err, StageError::Io { op: "remove", .. }), "{err}");
    assert_eq!(listing(layout.live()), vec!["old.dat"]);
    assert_eq!(listing(layout.staging()), vec!["b.dat"]);
    assert_eq!(
        notes.last().map(String::as_str),
        Some(format!("Error: failed to remove {}: remove refused", layout.backup().display()).as_str())
    );
}

#[test]
fn promotion_summary() {
    let replaced = Promotion { replaced_previous: true, removed_transient: 3 };
    let fresh = Promotion { replaced_previous: false, removed_transient: 0 };
    assert_eq!(replaced.to_string(), "Promoted new data (replaced previous data, 3 transient file(s) removed)");
    assert_eq!(fresh.to_string(), "Promoted new data (no previous data, 0 transient file(s) removed)");
}

#[test]
fn promote_only_removes_top_level_files_with_extension() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(&layout.staging().join("a.grib2"), "x");
    write(&layout.staging().join("a.grib2.idx"), "x");
    write(&layout.staging().join("nested/c.grib2"), "x");

    let promotion = stager.promote(&mut Vec::new()).unwrap();

    assert_eq!(promotion.removed_transient, 1);
    assert_eq!(listing(layout.live()), vec!["a.grib2.idx", "nested"]);
    assert!(layout.live().join("nested/c.grib2").exists());
}

#[test]
fn extension_with_leading_dot_is_normalized() {
    let dir = TempDir::new().unwrap();
    let layout = StageLayout::new(dir.path(), "rap");
    let stager = FsStager::new(layout.clone(), ".grib2");
    write(&layout.staging().join("a.grib2"), "x");

    let promotion = stager.promote(&mut Vec::new()).unwrap();

    assert_eq!(promotion.removed_transient, 1);
}

#[test]
fn clear_staging_removes_staging_and_backup() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(&layout.live().join("keep.dat"), "keep");
    write(&layout.staging().join("partial.grib2"), "x");
    write(&layout.backup().join("old.dat"), "old");

    let mut notes = Vec::new();
    stager.clear_staging(&mut notes).unwrap();

    assert!(!layout.staging().exists());
    assert!(!layout.backup().exists());
    assert_eq!(listing(layout.live()), vec!["keep.dat"]);
    assert_eq!(
        notes,
        vec![
            format!("Deleting directory: {}", layout.staging().display()),
            format!("Deleting directory: {}", layout.backup().display()),
        ]
    );
}

#[test]
fn clear_staging_is_ok_when_nothing_exists() {
    let (_dir, stager) = setup();
    stager.clear_staging(&mut Vec::new()).unwrap();
    stager.clear_staging(&mut Vec::new()).unwrap();
}

#[test]
fn clear_staging_restores_backup_when_live_missing() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(&layout.backup().join("old.dat"), "old");

    let mut notes = Vec::new();
    stager.clear_staging(&mut notes).unwrap();

    assert_eq!(listing(layout.live()), vec!["old.dat"]);
    assert!(!layout.backup().exists());
    assert!(notes.iter().any(|n| n.starts_with("Restoring directory:")));
}

#[test]
fn clear_staging_removes_stray_file_at_staging_path() {
    let (_dir, stager) = setup();
    let layout = stager.layout().clone();
    write(layout.staging(), "not a directory");

    stager.clear_staging(&mut Vec::new()).unwrap();

    assert!(!layout.staging().exists());
}

mod transient {
    use super::*;
    use proptest::prelude::*;

    fn arb_entries() -> impl Strategy<Value = Vec<(String, bool)>> {
        prop::collection::btree_map("[a-z]{1,8}", any::<bool>(), 0..12)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn promote_removes_exactly_the_transient_files(entries in arb_entries()) {
            let (_dir, stager) = setup();
            let layout = stager.layout().clone();
            fs::create_dir_all(layout.staging()).unwrap();
            let mut kept = Vec::new();
            for (stem, transient) in &entries {
                let name = if *transient { format!("{}.grib2", stem) } else { format!("{}.dat", stem) };
                fs::write(layout.staging().join(&name), "x").unwrap();
                if !transient {
                    kept.push(name);
                }
            }
            kept.sort();

            let promotion = stager.promote(&mut Vec::new()).unwrap();

            prop_assert_eq!(promotion.removed_transient, entries.len() - kept.len());
            prop_assert_eq!(listing(layout.live()), kept);
        }
    }
}
