// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn ledger(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("dup.ledger")
}

#[test]
fn zero_timeout_disables_check() {
    let dir = tempfile::tempdir().unwrap();
    let dc = DupCheck { timeout: 0, action: DupAction::Delete, content: false };
    assert_eq!(dc.check(&ledger(&dir), "f.dat", None, 100).unwrap(), DupVerdict::Fresh);
    assert_eq!(dc.check(&ledger(&dir), "f.dat", None, 101).unwrap(), DupVerdict::Fresh);
}

#[test]
fn second_sighting_is_a_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let dc = DupCheck { timeout: 3600, action: DupAction::Store, content: false };
    assert_eq!(dc.check(&ledger(&dir), "f.dat", None, 100).unwrap(), DupVerdict::Fresh);
    assert_eq!(
        dc.check(&ledger(&dir), "f.dat", None, 200).unwrap(),
        DupVerdict::Duplicate(DupAction::Store)
    );
}

#[test]
fn hashes_expire_after_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let dc = DupCheck { timeout: 60, action: DupAction::Delete, content: false };
    assert_eq!(dc.check(&ledger(&dir), "f.dat", None, 100).unwrap(), DupVerdict::Fresh);
    assert_eq!(dc.check(&ledger(&dir), "f.dat", None, 200).unwrap(), DupVerdict::Fresh);
}

#[test]
fn content_mode_distinguishes_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let dc = DupCheck { timeout: 3600, action: DupAction::Delete, content: true };
    assert_eq!(dc.check(&ledger(&dir), "f.dat", Some(b"aaa"), 100).unwrap(), DupVerdict::Fresh);
    // Same name, different bytes: not a duplicate in content mode.
    assert_eq!(dc.check(&ledger(&dir), "f.dat", Some(b"bbb"), 101).unwrap(), DupVerdict::Fresh);
    assert_eq!(
        dc.check(&ledger(&dir), "f.dat", Some(b"aaa"), 102).unwrap(),
        DupVerdict::Duplicate(DupAction::Delete)
    );
}

#[test]
fn duplicate_refreshes_the_sighting_time() {
    let dir = tempfile::tempdir().unwrap();
    let dc = DupCheck { timeout: 100, action: DupAction::Warn, content: false };
    dc.check(&ledger(&dir), "f.dat", None, 0).unwrap();
    assert!(matches!(
        dc.check(&ledger(&dir), "f.dat", None, 90).unwrap(),
        DupVerdict::Duplicate(_)
    ));
    // 90 + 100 > 150, so the refreshed entry still matches.
    assert!(matches!(
        dc.check(&ledger(&dir), "f.dat", None, 150).unwrap(),
        DupVerdict::Duplicate(_)
    ));
}
