// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dest::Destination;

fn sample(job_id: u32) -> JobMessage {
    JobMessage {
        job_id,
        destination: Destination::parse("loc:///tmp/out").unwrap(),
        fsa_pos: 0,
        lock: LockStyle::Dot,
        age_limit: 0,
        archive_time: 0,
        chmod: None,
        rename_rules: vec![],
        dup_check: None,
        file_size_offset: -1,
        block_size: 4096,
    }
}

#[test]
fn store_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let msg = sample(42);
    msg.store(dir.path()).unwrap();
    let back = JobMessage::load(dir.path(), 42).unwrap();
    assert_eq!(back.job_id, 42);
    assert_eq!(back.destination, msg.destination);
    assert_eq!(back.lock, LockStyle::Dot);
}

#[test]
fn missing_message_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(JobMessage::load(dir.path(), 7), Err(MsgError::Read { .. })));
}

#[test]
fn malformed_message_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("9.json"), b"{not json").unwrap();
    assert!(matches!(JobMessage::load(dir.path(), 9), Err(MsgError::Parse { .. })));
}

#[test]
fn in_flight_names_follow_lock_style() {
    let mut msg = sample(1);
    assert_eq!(msg.in_flight_name("f.dat"), ".f.dat");
    msg.lock = LockStyle::DotVms;
    assert_eq!(msg.in_flight_name("f.dat"), ".f.dat.");
    msg.lock = LockStyle::Postfix("_part".into());
    assert_eq!(msg.in_flight_name("f.dat"), "f.dat_part");
    msg.lock = LockStyle::None;
    assert_eq!(msg.in_flight_name("f.dat"), "f.dat");
}

#[test]
fn defaults_apply_when_fields_absent() {
    let dir = tempfile::tempdir().unwrap();
    let json = serde_json::json!({
        "job_id": 3,
        "destination": sample(3).destination,
        "fsa_pos": 1,
    });
    std::fs::write(dir.path().join("3.json"), serde_json::to_vec(&json).unwrap()).unwrap();
    let msg = JobMessage::load(dir.path(), 3).unwrap();
    assert_eq!(msg.lock, LockStyle::None);
    assert_eq!(msg.file_size_offset, -1);
    assert_eq!(msg.block_size, 4096);
    assert!(msg.rename_rules.is_empty());
}
