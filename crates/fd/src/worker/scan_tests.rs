// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::{Destination, DupCheck, LockStyle};

fn msg(job_id: u32) -> JobMessage {
    JobMessage {
        job_id,
        destination: Destination::parse("loc:///tmp/out").unwrap(),
        fsa_pos: 0,
        lock: LockStyle::None,
        age_limit: 0,
        archive_time: 0,
        chmod: None,
        rename_rules: vec![],
        dup_check: None,
        file_size_offset: -1,
        block_size: 4096,
    }
}

fn seed_workdir() -> (tempfile::TempDir, WorkDir) {
    let dir = tempfile::tempdir().unwrap();
    let wd = WorkDir::new(dir.path());
    wd.ensure_layout().unwrap();
    (dir, wd)
}

fn write_with_age(wd: &WorkDir, msg_name: &str, file: &str, age_secs: i64, now: i64) {
    let dir = wd.outgoing_dir().join(msg_name);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file);
    std::fs::write(&path, b"payload").unwrap();
    let mtime = now - age_secs;
    let tv = nix::sys::time::TimeVal::new(mtime, 0);
    nix::sys::stat::utimes(&path, &tv, &tv).unwrap();
}

fn real_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

#[test]
fn files_within_age_limit_survive() {
    let (_t, wd) = seed_workdir();
    let now = real_now();
    write_with_age(&wd, "1/0/a", "fresh.dat", 10, now);
    let mut m = msg(1);
    m.age_limit = 60;
    let out = scan_job_dir(&wd, &m, "1/0/a", false, now).unwrap();
    assert_eq!(out.files.len(), 1);
    assert_eq!(out.not_send_files, 0);
}

#[test]
fn aged_files_are_deleted_before_any_transfer() {
    let (_t, wd) = seed_workdir();
    let now = real_now();
    write_with_age(&wd, "1/0/a", "old.dat", 120, now);
    write_with_age(&wd, "1/0/a", "fresh.dat", 5, now);
    let mut m = msg(1);
    m.age_limit = 60;

    let out = scan_job_dir(&wd, &m, "1/0/a", false, now).unwrap();
    assert_eq!(out.age_deleted, 1);
    assert_eq!(out.not_send_files, 1);
    assert_eq!(out.not_send_bytes, 7);
    assert_eq!(out.files.len(), 1);
    assert_eq!(out.files[0].name, "fresh.dat");
    assert!(!wd.outgoing_dir().join("1/0/a/old.dat").exists());
}

#[test]
fn duplicate_delete_removes_second_sighting() {
    let (_t, wd) = seed_workdir();
    let now = real_now();
    let mut m = msg(1);
    m.dup_check = Some(DupCheck { timeout: 3600, action: afd_core::DupAction::Delete, content: false });

    write_with_age(&wd, "1/0/a", "same.dat", 1, now);
    let out = scan_job_dir(&wd, &m, "1/0/a", false, now).unwrap();
    assert_eq!(out.files.len(), 1);
    assert_eq!(out.dup_deleted, 0);

    write_with_age(&wd, "1/0/b", "same.dat", 1, now);
    let out = scan_job_dir(&wd, &m, "1/0/b", false, now).unwrap();
    assert_eq!(out.dup_deleted, 1);
    assert!(out.files.is_empty());
    assert!(!wd.outgoing_dir().join("1/0/b/same.dat").exists());
}

#[test]
fn duplicate_store_moves_file_aside() {
    let (_t, wd) = seed_workdir();
    let now = real_now();
    let mut m = msg(2);
    m.dup_check = Some(DupCheck { timeout: 3600, action: afd_core::DupAction::Store, content: false });

    write_with_age(&wd, "2/0/a", "keep.dat", 1, now);
    scan_job_dir(&wd, &m, "2/0/a", false, now).unwrap();
    write_with_age(&wd, "2/0/b", "keep.dat", 1, now);
    let out = scan_job_dir(&wd, &m, "2/0/b", false, now).unwrap();

    assert_eq!(out.dup_stored, 1);
    assert!(wd.store_dir().join("2").join("keep.dat").exists());
    assert!(!wd.outgoing_dir().join("2/0/b/keep.dat").exists());
}

#[test]
fn sort_orders_survivors_oldest_first() {
    let (_t, wd) = seed_workdir();
    let now = real_now();
    write_with_age(&wd, "1/0/a", "newer.dat", 10, now);
    write_with_age(&wd, "1/0/a", "oldest.dat", 300, now);
    write_with_age(&wd, "1/0/a", "middle.dat", 100, now);

    let out = scan_job_dir(&wd, &msg(1), "1/0/a", true, now).unwrap();
    let names: Vec<&str> = out.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["oldest.dat", "middle.dat", "newer.dat"]);
}

#[test]
fn missing_spool_dir_is_an_open_local_error() {
    let (_t, wd) = seed_workdir();
    let err = scan_job_dir(&wd, &msg(1), "9/9/ghost", false, 0).unwrap_err();
    assert_eq!(err.exit(), afd_core::TransferExit::OpenLocalError);
}
