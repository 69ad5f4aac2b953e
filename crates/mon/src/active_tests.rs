// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AFD_MON_ACTIVE");
    let active = ActiveFile { supervisor_pid: 4321, probe_pids: vec![100, 0, 102] };
    write_active_file(&path, &active).unwrap();
    assert_eq!(read_active_file(&path).unwrap(), Some(active));
}

#[test]
fn absent_file_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(read_active_file(&dir.path().join("nope")).unwrap(), None);
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AFD_MON_ACTIVE");
    std::fs::write(&path, b"not json").unwrap();
    assert!(matches!(read_active_file(&path), Err(ActiveFileError::Corrupt { .. })));
}
