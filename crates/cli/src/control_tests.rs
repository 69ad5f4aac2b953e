// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_mon::{write_active_file, ActiveFile};

fn workdir() -> (tempfile::TempDir, WorkDir) {
    let dir = tempfile::tempdir().unwrap();
    let wd = WorkDir::new(dir.path());
    wd.ensure_layout().unwrap();
    (dir, wd)
}

#[test]
fn check_alive_is_false_with_no_supervisor() {
    let (_t, wd) = workdir();
    assert!(!check_alive(&wd, Duration::from_millis(100)));
}

#[test]
fn ackn_on_the_probe_fifo_confirms_liveness() {
    let (_t, wd) = workdir();
    let cmd_fifo = mon_cmd_fifo(&wd);
    let probe_fifo = probe_only_fifo(&wd);
    ensure_fifo(&cmd_fifo).unwrap();
    ensure_fifo(&probe_fifo).unwrap();

    // Stand-in supervisor: hold the command fifo open and acknowledge.
    let _cmd_reader = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&cmd_fifo)
        .unwrap();
    let probe_fifo_clone = probe_fifo.clone();
    let answerer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        let mut f = std::fs::OpenOptions::new().write(true).open(&probe_fifo_clone).unwrap();
        f.write_all(&FifoCommand::Ackn.encode()).unwrap();
    });

    assert!(check_alive(&wd, Duration::from_secs(2)));
    answerer.join().unwrap();
}

#[test]
fn shutdown_falls_back_to_the_active_file() {
    let (_t, wd) = workdir();
    // Unanswered fifo plus an active file with a dead pid: both paths
    // fail, so the call reports failure without hanging.
    write_active_file(
        &wd.mon_active_file(),
        &ActiveFile { supervisor_pid: i32::MAX - 1, probe_pids: vec![] },
    )
    .unwrap();
    assert!(!send_shutdown(&wd, Duration::from_millis(100)));
}

#[test]
fn send_command_without_reader_is_an_error() {
    let (_t, wd) = workdir();
    let err = send_command(&mon_cmd_fifo(&wd), &FifoCommand::IsAlive);
    assert!(err.is_err());
}
