//! Tests for the directory tree updater

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use cordova_fs::updater::{DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
use cordova_fs::{
    DirEntry, EntryStats, PathMap, UpdateOptions, map_directory, merge_and_update_dir,
    merge_path_maps, update_path, update_path_with_stats,
};
use cordova_test_utils::{TestProject, seconds_ago};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn keys(map: &PathMap) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

fn collecting_log(messages: &mut Vec<String>) -> impl FnMut(&str) + '_ {
    move |msg: &str| messages.push(msg.to_string())
}

fn source_entry(sub_dir: &str, stats: EntryStats) -> DirEntry {
    DirEntry {
        sub_dir: PathBuf::from(sub_dir),
        stats: Some(stats),
    }
}

// --- map_directory ---

#[test]
fn map_directory_excluded_subdir_prunes_included_descendants() {
    let project = TestProject::new()
        .with_file("src/subdir/fileA", "a")
        .with_file("src/subdir/fileB", "b");

    let map = map_directory(project.root(), Path::new("src"), &["**/fileA"], &["subdir"]).unwrap();

    assert_eq!(keys(&map), vec![""]);
}

#[test]
fn map_directory_keeps_parents_of_included_files() {
    let project = TestProject::new()
        .with_file("src/subdir/fileA", "a")
        .with_file("src/subdir/fileB", "b");

    let map = map_directory(project.root(), Path::new("src"), &["**/fileA"], &[]).unwrap();

    assert_eq!(keys(&map), vec!["", "subdir", "subdir/fileA"]);
    assert!(map["subdir"].stats.unwrap().is_dir());
    assert_eq!(map["subdir/fileA"].sub_dir, PathBuf::from("src"));
}

#[test]
fn map_directory_includes_everything_by_default() {
    let project = TestProject::new()
        .with_file("www/index.html", "")
        .with_file("www/css/app.css", "")
        .with_dir("www/empty");

    let map = map_directory(project.root(), Path::new("www"), DEFAULT_INCLUDE, DEFAULT_EXCLUDE)
        .unwrap();

    assert_eq!(
        keys(&map),
        vec!["", "css", "css/app.css", "empty", "index.html"]
    );
}

#[test]
fn map_directory_missing_source_is_empty() {
    let project = TestProject::new();

    let map = map_directory(project.root(), Path::new("nope"), DEFAULT_INCLUDE, DEFAULT_EXCLUDE)
        .unwrap();

    assert!(map.is_empty());
}

// --- merge_path_maps ---

#[test]
fn merge_path_maps_last_source_wins() {
    let t = SystemTime::UNIX_EPOCH;
    let file = EntryStats::file(t);
    let dir = EntryStats::directory(t);

    let s1: PathMap = [
        ("".to_string(), source_entry("s1", dir)),
        ("a".to_string(), source_entry("s1", file)),
        ("b".to_string(), source_entry("s1", file)),
    ]
    .into();
    let s2: PathMap = [
        ("".to_string(), source_entry("s2", dir)),
        ("b".to_string(), source_entry("s2", file)),
        ("c".to_string(), source_entry("s2", file)),
    ]
    .into();
    let s3: PathMap = [
        ("".to_string(), source_entry("s3", dir)),
        ("a".to_string(), source_entry("s3", file)),
    ]
    .into();
    let target: PathMap = [
        ("".to_string(), source_entry("t", dir)),
        ("c".to_string(), source_entry("t", file)),
        ("d".to_string(), source_entry("t", file)),
    ]
    .into();

    let merged = merge_path_maps(Path::new("t"), &target, &[s1, s2, s3]);

    let winner = |rel: &str| merged[rel].source_path.clone();
    assert_eq!(winner(""), Some(PathBuf::from("s3")));
    assert_eq!(winner("a"), Some(PathBuf::from("s3/a")));
    assert_eq!(winner("b"), Some(PathBuf::from("s2/b")));
    assert_eq!(winner("c"), Some(PathBuf::from("s2/c")));
    assert_eq!(winner("d"), None);

    assert_eq!(merged["a"].target_stats, None);
    assert_eq!(merged["c"].target_stats, Some(file));
    assert_eq!(merged["d"].target_path, PathBuf::from("t/d"));
    assert_eq!(merged["d"].source_stats, None);
}

proptest! {
    #[test]
    fn merge_path_maps_winner_is_last_defining_source(
        sources in prop::collection::vec(prop::collection::btree_set("[a-e]", 0..5), 1..5),
        target in prop::collection::btree_set("[a-g]", 0..5),
    ) {
        let stats = EntryStats::file(SystemTime::UNIX_EPOCH);
        let source_maps: Vec<PathMap> = sources
            .iter()
            .enumerate()
            .map(|(i, keys)| {
                keys.iter()
                    .map(|k| (k.clone(), source_entry(&format!("s{i}"), stats)))
                    .collect()
            })
            .collect();
        let target_map: PathMap = target
            .iter()
            .map(|k| (k.clone(), source_entry("t", stats)))
            .collect();

        let merged = merge_path_maps(Path::new("t"), &target_map, &source_maps);

        let mut expected_keys: BTreeSet<String> = target.clone();
        for keys in &sources {
            expected_keys.extend(keys.iter().cloned());
        }
        prop_assert_eq!(merged.keys().cloned().collect::<BTreeSet<_>>(), expected_keys);

        for (rel, entry) in &merged {
            let last = sources.iter().rposition(|keys| keys.contains(rel));
            let expected = last.map(|i| PathBuf::from(format!("s{i}")).join(rel));
            prop_assert_eq!(&entry.source_path, &expected);
            prop_assert_eq!(entry.target_stats.is_some(), target.contains(rel));
        }
    }
}

// --- update_path_with_stats decision table ---

#[test]
fn absent_target_dir_source_creates_directory() {
    let project = TestProject::new().with_dir("src/dir");
    let options = UpdateOptions::with_root(project.root());
    let mut messages = Vec::new();

    let changed = update_path(
        &options,
        Path::new("out/dir"),
        Some(Path::new("src/dir")),
        &mut collecting_log(&mut messages),
    )
    .unwrap();

    assert!(changed);
    assert!(project.path("out/dir").is_dir());
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("mkdir"));
    assert!(messages[0].contains("out/dir"));
}

#[test]
fn directory_without_source_is_removed() {
    let project = TestProject::new().with_file("out/dir/nested.txt", "x");
    let options = UpdateOptions::with_root(project.root());
    let mut messages = Vec::new();

    let changed = update_path(
        &options,
        Path::new("out/dir"),
        None,
        &mut collecting_log(&mut messages),
    )
    .unwrap();

    assert!(changed);
    project.assert_not_exists("out/dir");
    assert!(messages[0].starts_with("rmdir"));
}

#[test]
fn absent_target_file_source_copies_and_logs_both_paths() {
    let project = TestProject::new().with_file("src/a.txt", "hello");
    let options = UpdateOptions::with_root(project.root());
    let mut messages = Vec::new();

    let changed = update_path(
        &options,
        Path::new("out/a.txt"),
        Some(Path::new("src/a.txt")),
        &mut collecting_log(&mut messages),
    )
    .unwrap();

    assert!(changed);
    assert_eq!(project.read_file("out/a.txt"), "hello");
    assert!(messages[0].contains("src/a.txt"));
    assert!(messages[0].contains("out/a.txt"));
}

#[test]
fn file_without_source_is_deleted_and_logs_target_only() {
    let project = TestProject::new().with_file("out/a.txt", "stale");
    let options = UpdateOptions::with_root(project.root());
    let mut messages = Vec::new();

    let changed = update_path(
        &options,
        Path::new("out/a.txt"),
        Some(Path::new("src/missing.txt")),
        &mut collecting_log(&mut messages),
    )
    .unwrap();

    assert!(changed);
    project.assert_not_exists("out/a.txt");
    assert!(messages[0].starts_with("delete"));
    assert!(messages[0].contains("out/a.txt"));
    assert!(!messages[0].contains("missing.txt"));
}

#[test]
fn directory_pair_is_a_no_op() {
    let project = TestProject::new().with_dir("src/d").with_dir("out/d");
    let options = UpdateOptions::with_root(project.root());
    let mut messages = Vec::new();

    let changed = update_path(
        &options,
        Path::new("out/d"),
        Some(Path::new("src/d")),
        &mut collecting_log(&mut messages),
    )
    .unwrap();

    assert!(!changed);
    assert!(messages.is_empty());
}

#[test]
fn newer_source_file_overwrites_target() {
    let project = TestProject::new()
        .with_file("src/a.txt", "new")
        .with_file("out/a.txt", "old");
    project.set_mtime("out/a.txt", seconds_ago(100));
    project.set_mtime("src/a.txt", seconds_ago(10));
    let options = UpdateOptions::with_root(project.root());

    let changed = update_path(
        &options,
        Path::new("out/a.txt"),
        Some(Path::new("src/a.txt")),
        &mut |_: &str| {},
    )
    .unwrap();

    assert!(changed);
    assert_eq!(project.read_file("out/a.txt"), "new");
}

#[test]
fn older_or_equal_source_file_is_not_copied() {
    let project = TestProject::new()
        .with_file("src/a.txt", "source")
        .with_file("out/a.txt", "target");
    let same = seconds_ago(50);
    project.set_mtime("src/a.txt", same);
    project.set_mtime("out/a.txt", same);
    let options = UpdateOptions::with_root(project.root());

    let equal = update_path(
        &options,
        Path::new("out/a.txt"),
        Some(Path::new("src/a.txt")),
        &mut |_: &str| {},
    )
    .unwrap();
    project.set_mtime("src/a.txt", seconds_ago(500));
    let older = update_path(
        &options,
        Path::new("out/a.txt"),
        Some(Path::new("src/a.txt")),
        &mut |_: &str| {},
    )
    .unwrap();

    assert!(!equal);
    assert!(!older);
    assert_eq!(project.read_file("out/a.txt"), "target");
}

#[test]
fn forced_update_copies_regardless_of_mtime() {
    let project = TestProject::new()
        .with_file("src/a.txt", "source")
        .with_file("out/a.txt", "target");
    project.set_mtime("src/a.txt", seconds_ago(500));
    let options = UpdateOptions::with_root(project.root()).forced(true);

    let changed = update_path(
        &options,
        Path::new("out/a.txt"),
        Some(Path::new("src/a.txt")),
        &mut |_: &str| {},
    )
    .unwrap();

    assert!(changed);
    assert_eq!(project.read_file("out/a.txt"), "source");
}

#[test]
fn directory_target_replaced_by_source_file() {
    let project = TestProject::new()
        .with_file("src/thing", "file body")
        .with_file("out/thing/inner.txt", "x");
    let options = UpdateOptions::with_root(project.root());
    let mut messages = Vec::new();

    let changed = update_path(
        &options,
        Path::new("out/thing"),
        Some(Path::new("src/thing")),
        &mut collecting_log(&mut messages),
    )
    .unwrap();

    assert!(changed);
    assert_eq!(project.read_file("out/thing"), "file body");
    let joined = messages.join("\n");
    assert_eq!(joined.matches("out/thing").count(), 2);
    assert_eq!(joined.matches("src/thing").count(), 1);
}

#[test]
fn file_target_replaced_by_source_directory() {
    let project = TestProject::new()
        .with_dir("src/thing")
        .with_file("out/thing", "file body");
    let options = UpdateOptions::with_root(project.root());

    let changed = update_path(
        &options,
        Path::new("out/thing"),
        Some(Path::new("src/thing")),
        &mut |_: &str| {},
    )
    .unwrap();

    assert!(changed);
    assert!(project.path("out/thing").is_dir());
}

#[test]
fn stats_only_decision_uses_given_stats() {
    // Stats say the target is newer, so nothing is touched even though the
    // paths do not exist on disk.
    let options = UpdateOptions::default();
    let now = SystemTime::now();
    let target = EntryStats::file(now);
    let source = EntryStats::file(now - Duration::from_secs(5));

    let changed = update_path_with_stats(
        &options,
        Path::new("/nonexistent/target"),
        Some(&target),
        Some(Path::new("/nonexistent/source")),
        Some(&source),
        &mut |_: &str| {},
    )
    .unwrap();

    assert!(!changed);
}

// --- merge_and_update_dir ---

#[test]
fn merge_and_update_dir_overlays_sources_in_order() {
    let project = TestProject::new()
        .with_file("www/index.html", "www index")
        .with_file("www/js/app.js", "app")
        .with_file("merges/android/index.html", "merged index")
        .with_file("merges/android/css/android.css", "css");
    let options = UpdateOptions::with_root(project.root());

    let changed = merge_and_update_dir(
        &options,
        Path::new("platforms/android/www"),
        &["www", "merges/android"],
        &mut |_: &str| {},
    )
    .unwrap();

    assert!(changed);
    assert_eq!(
        project.read_file("platforms/android/www/index.html"),
        "merged index"
    );
    assert_eq!(project.read_file("platforms/android/www/js/app.js"), "app");
    assert_eq!(
        project.read_file("platforms/android/www/css/android.css"),
        "css"
    );
}

#[test]
fn merge_and_update_dir_is_idempotent() {
    let project = TestProject::new()
        .with_file("www/index.html", "index")
        .with_file("www/js/app.js", "app");
    project.set_mtime("www/index.html", seconds_ago(60));
    project.set_mtime("www/js/app.js", seconds_ago(60));
    let options = UpdateOptions::with_root(project.root());

    let first = merge_and_update_dir(&options, Path::new("out"), &["www"], &mut |_: &str| {})
        .unwrap();
    let second = merge_and_update_dir(&options, Path::new("out"), &["www"], &mut |_: &str| {})
        .unwrap();

    assert!(first);
    assert!(!second);
}

#[test]
fn merge_and_update_dir_removes_stale_target_entries() {
    let project = TestProject::new()
        .with_file("www/index.html", "index")
        .with_file("out/old/stale.js", "stale")
        .with_file("out/stale.txt", "stale");
    let options = UpdateOptions::with_root(project.root());

    merge_and_update_dir(&options, Path::new("out"), &["www"], &mut |_: &str| {}).unwrap();

    project.assert_exists("out/index.html");
    project.assert_not_exists("out/old");
    project.assert_not_exists("out/stale.txt");
}

#[test]
fn merge_and_update_dir_ignores_missing_sources() {
    let project = TestProject::new().with_file("www/index.html", "index");
    let options = UpdateOptions::with_root(project.root());

    let changed = merge_and_update_dir(
        &options,
        Path::new("out"),
        &["www", "merges/ios"],
        &mut |_: &str| {},
    )
    .unwrap();

    assert!(changed);
    assert_eq!(fs::read_dir(project.path("out")).unwrap().count(), 1);
}
