// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::{Destination, LockStyle};
use afd_statearea::{Fsa, HostConfig};

struct Fixture {
    _dir: tempfile::TempDir,
    workdir: WorkDir,
    target: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let workdir = WorkDir::new(dir.path().join("afd"));
    workdir.ensure_layout().unwrap();
    let target = dir.path().join("out");
    Fixture { _dir: dir, workdir, target }
}

fn seed(fx: &Fixture, lock: LockStyle, files: &[(&str, &[u8])]) -> String {
    let msg = afd_core::JobMessage {
        job_id: 1,
        destination: Destination::parse(&format!("loc://{}", fx.target.display())).unwrap(),
        fsa_pos: 0,
        lock,
        age_limit: 0,
        archive_time: 0,
        chmod: None,
        rename_rules: vec![],
        dup_check: None,
        file_size_offset: -1,
        block_size: 4096,
    };
    msg.store(&fx.workdir.msg_dir()).unwrap();
    let msg_name = "1/0/x1".to_string();
    let spool = fx.workdir.outgoing_dir().join(&msg_name);
    std::fs::create_dir_all(&spool).unwrap();
    for (name, content) in files {
        std::fs::write(spool.join(name), content).unwrap();
    }
    msg_name
}

fn fsa_with_credit(fx: &Fixture, files: u32, bytes: u64) -> afd_statearea::FsaSingle {
    let mut cfg = HostConfig::new("h1");
    cfg.host_status = afd_core::host_status::CREATE_TARGET_DIR;
    let mut fsa = Fsa::create(&fx.workdir.fsa_file(), &[cfg]).unwrap();
    fsa.with_host_lock(0, afd_statearea::LockDomain::Tfc, |h| {
        h.total_file_counter = files;
        h.total_file_size = bytes;
    })
    .unwrap();
    afd_statearea::FsaSingle::attach_pos(&fx.workdir.fsa_file(), 0).unwrap()
}

#[test]
fn sends_one_file_and_settles_all_counters() {
    let fx = fixture();
    let msg_name = seed(&fx, LockStyle::None, &[("f.dat", &[7u8; 100])]);
    let mut fsa = fsa_with_credit(&fx, 1, 100);

    let summary = run_send(&fx.workdir, &mut fsa, 0, &msg_name).unwrap();
    assert_eq!(summary.files_sent, 1);
    assert_eq!(summary.bytes_sent, 100);
    assert_eq!(summary.bursts, 0);
    assert!(!summary.host_gone);
    assert_eq!(summary.log_line(), "moved 100 bytes in 1 file");

    assert_eq!(std::fs::read(fx.target.join("f.dat")).unwrap(), vec![7u8; 100]);
    // Spool consumed.
    assert!(!fx.workdir.outgoing_dir().join(&msg_name).exists());

    let host = fsa.host().unwrap();
    assert_eq!(host.total_file_counter, 0);
    assert_eq!(host.total_file_size, 0);
    assert_eq!(host.file_counter_done, 1);
    assert_eq!(host.bytes_send, 100);
    assert_eq!(host.job_status[0].no_of_files_done, 1);
    assert_eq!(host.job_status[0].file_name_in_use(), "");
}

#[test]
fn dot_lock_leaves_no_in_flight_name_behind() {
    let fx = fixture();
    let msg_name = seed(&fx, LockStyle::Dot, &[("f.dat", b"abc")]);
    let mut fsa = fsa_with_credit(&fx, 1, 3);

    run_send(&fx.workdir, &mut fsa, 0, &msg_name).unwrap();
    assert!(fx.target.join("f.dat").exists());
    assert!(!fx.target.join(".f.dat").exists());
}

#[test]
fn lockfile_style_removes_the_peer_file() {
    let fx = fixture();
    let msg_name = seed(&fx, LockStyle::Lockfile, &[("f.dat", b"abc")]);
    let mut fsa = fsa_with_credit(&fx, 1, 3);

    run_send(&fx.workdir, &mut fsa, 0, &msg_name).unwrap();
    assert!(fx.target.join("f.dat").exists());
    assert!(!fx.target.join("f.dat.lock").exists());
}

#[test]
fn success_clears_error_counter_and_auto_pause() {
    let fx = fixture();
    let msg_name = seed(&fx, LockStyle::None, &[("f.dat", b"abc")]);
    let mut fsa = fsa_with_credit(&fx, 1, 3);
    fsa.with_lock(afd_statearea::LockDomain::Ec, |h| h.error_counter = 4).unwrap();
    fsa.with_lock(afd_statearea::LockDomain::Hs, |h| {
        h.host_status |= afd_core::host_status::AUTO_PAUSE_QUEUE;
    })
    .unwrap();

    run_send(&fx.workdir, &mut fsa, 0, &msg_name).unwrap();
    let host = fsa.host().unwrap();
    assert_eq!(host.error_counter, 0);
    assert_eq!(host.host_status & afd_core::host_status::AUTO_PAUSE_QUEUE, 0);
}

#[test]
fn archive_time_moves_instead_of_deleting() {
    let fx = fixture();
    let msg = afd_core::JobMessage {
        job_id: 3,
        destination: Destination::parse(&format!("loc://{}", fx.target.display())).unwrap(),
        fsa_pos: 0,
        lock: LockStyle::None,
        age_limit: 0,
        archive_time: 3600,
        chmod: None,
        rename_rules: vec![],
        dup_check: None,
        file_size_offset: -1,
        block_size: 4096,
    };
    msg.store(&fx.workdir.msg_dir()).unwrap();
    let spool = fx.workdir.outgoing_dir().join("3/0/a");
    std::fs::create_dir_all(&spool).unwrap();
    std::fs::write(spool.join("f.dat"), b"abc").unwrap();

    let mut fsa = fsa_with_credit(&fx, 1, 3);
    run_send(&fx.workdir, &mut fsa, 0, "3/0/a").unwrap();
    assert!(fx.workdir.archive_dir().join("3").join("f.dat").exists());
}

#[test]
fn rename_rules_apply_at_the_target() {
    let fx = fixture();
    let msg = afd_core::JobMessage {
        job_id: 4,
        destination: Destination::parse(&format!("loc://{}", fx.target.display())).unwrap(),
        fsa_pos: 0,
        lock: LockStyle::None,
        age_limit: 0,
        archive_time: 0,
        chmod: None,
        rename_rules: vec![afd_core::RenameRule::new(r"\.tmp$", ".dat").unwrap()],
        dup_check: None,
        file_size_offset: -1,
        block_size: 4096,
    };
    msg.store(&fx.workdir.msg_dir()).unwrap();
    let spool = fx.workdir.outgoing_dir().join("4/0/a");
    std::fs::create_dir_all(&spool).unwrap();
    std::fs::write(spool.join("payload.tmp"), b"abc").unwrap();

    let mut fsa = fsa_with_credit(&fx, 1, 3);
    run_send(&fx.workdir, &mut fsa, 0, "4/0/a").unwrap();
    assert!(fx.target.join("payload.dat").exists());
    assert!(!fx.target.join("payload.tmp").exists());
}

#[test]
fn unsupported_scheme_maps_to_connect_error() {
    let fx = fixture();
    let msg = afd_core::JobMessage {
        job_id: 5,
        destination: Destination::parse("ftp://u@h/dir").unwrap(),
        fsa_pos: 0,
        lock: LockStyle::None,
        age_limit: 0,
        archive_time: 0,
        chmod: None,
        rename_rules: vec![],
        dup_check: None,
        file_size_offset: -1,
        block_size: 4096,
    };
    msg.store(&fx.workdir.msg_dir()).unwrap();
    std::fs::create_dir_all(fx.workdir.outgoing_dir().join("5/0/a")).unwrap();
    let mut fsa = fsa_with_credit(&fx, 0, 0);

    let err = run_send(&fx.workdir, &mut fsa, 0, "5/0/a").unwrap_err();
    assert_eq!(err.exit(), afd_core::TransferExit::ConnectError);
}
