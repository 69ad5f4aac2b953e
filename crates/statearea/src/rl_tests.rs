// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn opts() -> ListOptions {
    ListOptions::default()
}

#[test]
fn fresh_attach_creates_one_chunk_file() {
    let dir = tempfile::tempdir().unwrap();
    let rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    assert_eq!(rl.len(), 0);
    let meta = std::fs::metadata(dir.path().join("d1")).unwrap();
    assert_eq!(meta.len(), expected_file_size(0));
}

#[test]
fn new_files_are_fetched_then_skipped_once_retrieved() {
    let dir = tempfile::tempdir().unwrap();
    let mut rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();

    assert_eq!(rl.check_list("a.dat", 10, 500, &opts(), 1000).unwrap(), FetchDecision::Fetch);
    rl.mark_retrieved("a.dat");
    // Unchanged file on the next pass: nothing to do.
    assert_eq!(rl.check_list("a.dat", 10, 500, &opts(), 2000).unwrap(), FetchDecision::Skip);
}

#[test]
fn size_or_mtime_change_clears_retrieved() {
    let dir = tempfile::tempdir().unwrap();
    let mut rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    rl.check_list("a.dat", 10, 500, &opts(), 1000).unwrap();
    rl.mark_retrieved("a.dat");

    assert_eq!(rl.check_list("a.dat", 11, 500, &opts(), 2000).unwrap(), FetchDecision::Fetch);
    rl.mark_retrieved("a.dat");
    assert_eq!(rl.check_list("a.dat", 11, 777, &opts(), 3000).unwrap(), FetchDecision::Fetch);
}

#[test]
fn get_once_only_never_refetches() {
    let dir = tempfile::tempdir().unwrap();
    let mut rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    let o = ListOptions { stupid_mode: StupidMode::GetOnceOnly, ..opts() };
    rl.check_list("a.dat", 10, 500, &o, 1000).unwrap();
    rl.mark_retrieved("a.dat");
    // Even with a new size the file is not fetched again.
    assert_eq!(rl.check_list("a.dat", 999, 600, &o, 2000).unwrap(), FetchDecision::Skip);
}

#[test]
fn ignore_filters_skip_without_marking_retrieved() {
    let dir = tempfile::tempdir().unwrap();
    let mut rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    let o = ListOptions {
        ignore_size: Some((TriSign::LessThan, 100)),
        ..opts()
    };
    // "< 100" selects files bigger than 100 bytes; 50 is ignored.
    assert_eq!(rl.check_list("small.dat", 50, 10, &o, 1000).unwrap(), FetchDecision::Skip);
    assert_eq!(rl.entries()[0].retrieved, 0);
    assert_eq!(rl.check_list("big.dat", 500, 10, &o, 1000).unwrap(), FetchDecision::Fetch);

    let o = ListOptions {
        ignore_file_time: Some((TriSign::LessThan, 60)),
        ..opts()
    };
    // "< 60" selects files older than a minute; age 10 is ignored,
    // age 940 is fetched.
    assert_eq!(rl.check_list("new.dat", 1, 990, &o, 1000).unwrap(), FetchDecision::Skip);
    assert_eq!(rl.check_list("old.dat", 1, 60, &o, 1000).unwrap(), FetchDecision::Fetch);
}

#[test]
fn transient_mode_deletes_on_disk_list() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
        rl.check_list("a.dat", 10, 500, &opts(), 1000).unwrap();
        rl.detach().unwrap();
    }
    assert!(dir.path().join("d1").exists());

    let mut rl = RetrieveList::attach(dir.path(), "d1", true).unwrap();
    assert!(!dir.path().join("d1").exists());
    assert_eq!(rl.len(), 0);
    // Transient list still tracks within the run.
    rl.check_list("a.dat", 10, 500, &opts(), 1000).unwrap();
    rl.mark_retrieved("a.dat");
    assert_eq!(rl.check_list("a.dat", 10, 500, &opts(), 1100).unwrap(), FetchDecision::Skip);
}

#[test]
fn compact_drops_vanished_entries_and_leaves_no_stragglers() {
    let dir = tempfile::tempdir().unwrap();
    let mut rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    for name in ["a", "b", "c", "d"] {
        rl.check_list(name, 1, 1, &opts(), 10).unwrap();
    }
    rl.mark_not_in_list_all();
    // Only b and d are still on the remote.
    rl.check_list("b", 1, 1, &opts(), 20).unwrap();
    rl.check_list("d", 1, 1, &opts(), 20).unwrap();
    rl.compact().unwrap();

    assert_eq!(rl.len(), 2);
    let names: Vec<&str> = rl.entries().iter().map(|e| e.file_name()).collect();
    assert_eq!(names, vec!["b", "d"]);
    assert!(rl.entries().iter().all(|e| e.in_list == 1));
}

#[test]
fn file_size_tracks_step_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let mut rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    for i in 0..(RETRIEVE_LIST_STEP_SIZE + 1) {
        rl.check_list(&format!("f{i}"), 1, 1, &opts(), 10).unwrap();
    }
    rl.detach().unwrap();
    let meta = std::fs::metadata(dir.path().join("d1")).unwrap();
    assert_eq!(meta.len(), expected_file_size(RETRIEVE_LIST_STEP_SIZE + 1));
    assert_eq!(
        meta.len() as usize,
        AFD_WORD_OFFSET + 2 * RETRIEVE_LIST_STEP_SIZE * std::mem::size_of::<RlEntry>()
    );
}

#[test]
fn legacy_ascii_list_converts_with_utc_dates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("d1");
    write_legacy_ascii(
        &path,
        &[
            ("one.dat", 100, "20200102030405", true, true),
            ("two.dat", 200, "20200102030405", false, true),
            ("three.dat", 300, "", false, false),
        ],
    )
    .unwrap();

    let rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    assert_eq!(rl.len(), 3);

    let one = &rl.entries()[0];
    assert_eq!(one.file_name(), "one.dat");
    assert_eq!(one.size, 100);
    // 2020-01-02 03:04:05 UTC
    assert_eq!(one.file_mtime, 1_577_934_245);
    assert_eq!(one.got_date, 1);
    assert_eq!(one.retrieved, 1);
    assert_eq!(one.in_list, 1);

    let three = &rl.entries()[2];
    assert_eq!(three.got_date, 0);
    assert_eq!(three.file_mtime, -1);
    assert_eq!(three.retrieved, 0);

    // The converted file carries the current version and layout size.
    let meta = std::fs::metadata(&path).unwrap();
    assert_eq!(meta.len(), expected_file_size(3));
}

#[test]
fn unknown_version_is_discarded_and_recreated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("d1");
    let mut bytes = vec![0u8; 64];
    bytes[0] = 3; // count = 3
    bytes[7] = 99; // unknown version
    std::fs::write(&path, &bytes).unwrap();

    let rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    assert_eq!(rl.len(), 0);
}

#[test]
fn size_mismatch_for_claimed_version_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("d1");
    // Claims current version with count 5 but the file is far too small.
    let header = AreaHeader::new(5, CURRENT_RL_VERSION);
    let mut bytes = header.as_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; 32]);
    std::fs::write(&path, &bytes).unwrap();

    let rl = RetrieveList::attach(dir.path(), "d1", false).unwrap();
    assert_eq!(rl.len(), 0);
}
