// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::ConnectStatus;

fn two_hosts() -> Vec<HostConfig> {
    let mut h1 = HostConfig::new("h1");
    h1.allowed_transfers = 2;
    h1.real_hostname[0] = "one.example".into();
    let h2 = HostConfig::new("h2");
    vec![h1, h2]
}

#[test]
fn create_clamps_allowed_transfers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsa_status");
    let mut cfg = HostConfig::new("h1");
    cfg.allowed_transfers = 99;
    let fsa = Fsa::create(&path, &[cfg]).unwrap();
    assert_eq!(fsa.host(0).unwrap().allowed_transfers, MAX_SLOTS as u32);
}

#[test]
fn position_of_finds_hosts_by_alias() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsa_status");
    let fsa = Fsa::create(&path, &two_hosts()).unwrap();
    assert_eq!(fsa.position_of("h2"), Some(1));
    assert_eq!(fsa.position_of("nope"), None);
}

#[test]
fn locked_counter_updates_are_visible_to_single_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsa_status");
    let mut fsa = Fsa::create(&path, &two_hosts()).unwrap();
    let mut single = FsaSingle::attach_pos(&path, 0).unwrap();

    fsa.with_host_lock(0, LockDomain::Tfc, |h| {
        h.total_file_counter += 3;
        h.total_file_size += 300;
    })
    .unwrap();

    assert_eq!(single.host().unwrap().total_file_counter, 3);

    single
        .with_lock(LockDomain::Tfc, |h| {
            h.total_file_counter -= 1;
            h.total_file_size -= 100;
        })
        .unwrap();
    assert_eq!(fsa.host(0).unwrap().total_file_counter, 2);
    assert_eq!(fsa.host(0).unwrap().total_file_size, 200);
}

#[test]
fn lock_domains_have_distinct_offsets() {
    for pos in 0..3 {
        let tfc = LockDomain::Tfc.file_offset(pos);
        let ec = LockDomain::Ec.file_offset(pos);
        let hs = LockDomain::Hs.file_offset(pos);
        assert_ne!(tfc, ec);
        assert_ne!(ec, hs);
        assert_ne!(tfc, hs);
    }
}

#[test]
fn worker_view_survives_regeneration_when_host_stays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsa_status");
    Fsa::create(&path, &two_hosts()).unwrap();
    let mut single = FsaSingle::attach_pos(&path, 1).unwrap();

    // Regenerate with h2 promoted to position 0.
    Fsa::create(&path, &[HostConfig::new("h2")]).unwrap();
    assert!(single.verify().unwrap());
    assert_eq!(single.pos(), 0);
    assert_eq!(single.host().unwrap().host_alias(), "h2");
}

#[test]
fn worker_view_reports_vanished_host() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsa_status");
    Fsa::create(&path, &two_hosts()).unwrap();
    let mut single = FsaSingle::attach_pos(&path, 1).unwrap();

    Fsa::create(&path, &[HostConfig::new("h1")]).unwrap();
    assert!(!single.verify().unwrap());
}

#[test]
fn slot_lifecycle_through_supervisor_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fsa_status");
    let mut fsa = Fsa::create(&path, &two_hosts()).unwrap();

    let host = fsa.host_mut(0).unwrap();
    let slot = host.free_slot().unwrap();
    host.job_status[slot].pid = 4321;
    host.job_status[slot].set_connect_status(ConnectStatus::Connecting);
    host.active_transfers += 1;

    assert_eq!(fsa.host(0).unwrap().free_slot(), Some(1));

    let host = fsa.host_mut(0).unwrap();
    host.job_status[slot].reset(false);
    host.active_transfers -= 1;
    assert_eq!(fsa.host(0).unwrap().job_status[slot].connect_status(), ConnectStatus::Disconnect);
    assert_eq!(fsa.host(0).unwrap().free_slot(), Some(0));
}
