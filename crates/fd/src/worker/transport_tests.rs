// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write as _;

#[test]
fn enter_dir_creates_only_when_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("out");
    let mut t = LocTransport::new(&missing);
    assert!(matches!(t.enter_dir(false), Err(TransferError::Chdir { .. })));
    t.enter_dir(true).unwrap();
    assert!(missing.is_dir());
}

#[test]
fn open_write_finalize_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = LocTransport::new(dir.path());
    t.connect().unwrap();
    {
        let mut w = t.open_remote(".f.dat", 0).unwrap();
        w.write_all(b"hello").unwrap();
    }
    t.finalize(".f.dat", "f.dat").unwrap();
    assert_eq!(std::fs::read(dir.path().join("f.dat")).unwrap(), b"hello");
    assert!(!dir.path().join(".f.dat").exists());
}

#[test]
fn offset_opens_resume_where_the_last_try_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = LocTransport::new(dir.path());
    std::fs::write(dir.path().join("f.dat"), b"12345").unwrap();
    assert_eq!(t.remote_size("f.dat").unwrap(), Some(5));
    assert_eq!(t.remote_size("ghost").unwrap(), None);

    let mut w = t.open_remote("f.dat", 5).unwrap();
    w.write_all(b"678").unwrap();
    drop(w);
    assert_eq!(std::fs::read(dir.path().join("f.dat")).unwrap(), b"12345678");
}

#[test]
fn list_skips_dotfiles_and_subdirs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.dat"), b"abc").unwrap();
    std::fs::write(dir.path().join(".partial"), b"x").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();

    let mut t = LocTransport::new(dir.path());
    let listing = t.list().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "a.dat");
    assert_eq!(listing[0].size, 3);
    assert!(listing[0].mtime > 0);
}

#[test]
fn remove_remote_and_error_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = LocTransport::new(dir.path());
    std::fs::write(dir.path().join("a.dat"), b"abc").unwrap();
    t.remove_remote("a.dat").unwrap();
    assert!(!dir.path().join("a.dat").exists());

    let err = match t.open_read("a.dat") {
        Ok(_) => panic!("expected open_read to fail"),
        Err(e) => e,
    };
    assert_eq!(err.exit(), afd_core::TransferExit::OpenRemoteError);
    assert_eq!(TransferError::Timeout.exit(), afd_core::TransferExit::Timeout);
}
