// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn seeded_workdir(config: &str) -> (tempfile::TempDir, WorkDir) {
    let dir = tempfile::tempdir().unwrap();
    let wd = WorkDir::new(dir.path());
    wd.ensure_layout().unwrap();
    std::fs::write(wd.afd_mon_config(), config).unwrap();
    (dir, wd)
}

#[test]
fn start_builds_msa_and_process_list() {
    let (_t, wd) = seeded_workdir("north north.example 4444 5\nsouth\n");
    let sup = MonSupervisor::start(wd.clone()).unwrap();
    assert_eq!(sup.pl.len(), 2);
    assert_eq!(sup.pl[0].alias.as_str(), "north");
    assert!(sup.pl.iter().all(|e| e.pid == 0));

    let msa = Msa::attach(&wd.msa_file()).unwrap();
    assert_eq!(msa.count(), 2);
    assert_eq!(msa.row(1).unwrap().afd_alias(), "south");
}

#[test]
fn second_supervisor_is_locked_out() {
    let (_t, wd) = seeded_workdir("north\n");
    let _first = MonSupervisor::start(wd.clone()).unwrap();
    assert!(matches!(
        MonSupervisor::start(wd),
        Err(MonSupervisorError::LockFailed(_))
    ));
}

#[test]
fn missing_config_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let wd = WorkDir::new(dir.path());
    wd.ensure_layout().unwrap();
    assert!(matches!(MonSupervisor::start(wd), Err(MonSupervisorError::Io(_))));
}

#[test]
fn disable_mon_marks_row_and_keeps_it_down() {
    let (_t, wd) = seeded_workdir("north\n");
    let mut sup = MonSupervisor::start(wd).unwrap();
    assert!(!sup.handle_command(FifoCommand::DisableMon(0)));
    assert_eq!(
        sup.msa.row(0).unwrap().connect_status(),
        ConnectStatus::Disabled
    );
    // Exit of a disabled row's probe must not restart it.
    sup.children.insert(555, 0);
    sup.pl[0].pid = 555;
    sup.on_probe_exit(555, Some(1));
    assert_eq!(sup.pl[0].pid, 0);
}

#[test]
fn shutdown_command_is_recognized() {
    let (_t, wd) = seeded_workdir("north\n");
    let mut sup = MonSupervisor::start(wd).unwrap();
    assert!(sup.handle_command(FifoCommand::Shutdown));
}

#[test]
fn clean_probe_exit_resets_restart_state() {
    let (_t, wd) = seeded_workdir("north\n");
    let mut sup = MonSupervisor::start(wd).unwrap();
    sup.children.insert(700, 0);
    sup.pl[0].pid = 700;
    sup.pl[0].number_of_restarts = 5;
    sup.on_probe_exit(700, Some(0));
    assert_eq!(sup.pl[0].pid, 0);
    assert_eq!(sup.pl[0].number_of_restarts, 0);
    // Unknown pid is ignored.
    sup.on_probe_exit(700, Some(0));
}

#[test]
fn fifo_paths_live_under_the_fifo_dir() {
    let wd = WorkDir::new("/afd");
    assert_eq!(mon_cmd_fifo(&wd), std::path::PathBuf::from("/afd/fifodir/afd_mon_cmd.fifo"));
    assert_eq!(mon_resp_fifo(&wd), std::path::PathBuf::from("/afd/fifodir/afd_mon_resp.fifo"));
    assert_eq!(
        probe_only_fifo(&wd),
        std::path::PathBuf::from("/afd/fifodir/afd_mon_probe_only.fifo")
    );
}
