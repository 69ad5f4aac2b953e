// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane helpers shared by `mafd` and `mafdcmd`: liveness
//! probing, startup, and the shutdown handshake with `afd_mon`.

use afd_core::WorkDir;
use afd_fd::fifos::ensure_fifo;
use afd_mon::read_active_file;
use afd_mon::supervisor::{mon_cmd_fifo, mon_resp_fifo, probe_only_fifo};
use afd_wire::{FifoCommand, FifoDecoder};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::{Read, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a liveness or shutdown probe waits for the acknowledge.
pub const ALIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Write an opcode onto a fifo, creating the fifo if needed.
pub fn send_command(path: &Path, cmd: &FifoCommand) -> std::io::Result<()> {
    ensure_fifo(path)?;
    let mut fifo = std::fs::OpenOptions::new()
        .write(true)
        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
        .open(path)?;
    fifo.write_all(&cmd.encode())
}

/// Wait for an ACKN byte on `path` within `timeout`.
fn await_ackn(path: &Path, timeout: Duration) -> bool {
    ensure_fifo(path).ok();
    let Ok(fifo) = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
        .open(path)
    else {
        return false;
    };
    let mut decoder = FifoDecoder::new();
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        let millis = remaining.as_millis().min(i32::MAX as u128) as i32;
        let poll_timeout = PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX);
        let mut fds = [PollFd::new(fifo.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, poll_timeout) {
            Ok(n) if n > 0 => {
                let mut buf = [0u8; 64];
                let mut reader = &fifo;
                if let Ok(n) = reader.read(&mut buf) {
                    if decoder.feed(&buf[..n]).iter().any(|c| *c == FifoCommand::Ackn) {
                        return true;
                    }
                }
            }
            Ok(_) => return false,
            Err(nix::errno::Errno::EINTR) => {}
            Err(_) => return false,
        }
    }
}

/// Is an `afd_mon` serving this work dir?
pub fn check_alive(workdir: &WorkDir, timeout: Duration) -> bool {
    if send_command(&mon_cmd_fifo(workdir), &FifoCommand::IsAlive).is_err() {
        return false;
    }
    await_ackn(&probe_only_fifo(workdir), timeout)
}

/// Start `afd_mon` detached; it daemonizes through its own lock file.
pub fn start_afd_mon(workdir: &WorkDir) -> std::io::Result<()> {
    let exe = sibling_exe("afd_mon");
    std::process::Command::new(exe)
        .arg("-w")
        .arg(workdir.root())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map(|_| ())
}

/// Ask `afd_mon` to shut down; waits for the acknowledge and falls back
/// to SIGINT via the active file.
pub fn send_shutdown(workdir: &WorkDir, timeout: Duration) -> bool {
    if send_command(&mon_cmd_fifo(workdir), &FifoCommand::Shutdown).is_ok()
        && await_ackn(&mon_resp_fifo(workdir), timeout)
    {
        return true;
    }

    // No acknowledge: kill by recorded pid if one is there.
    match read_active_file(&workdir.mon_active_file()) {
        Ok(Some(active)) if active.supervisor_pid > 0 => {
            let pid = nix::unistd::Pid::from_raw(active.supervisor_pid);
            nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGINT).is_ok()
        }
        _ => false,
    }
}

fn sibling_exe(name: &str) -> std::path::PathBuf {
    if let Some(dir) = std::env::var_os("AFD_BIN_DIR") {
        return std::path::PathBuf::from(dir).join(name);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join(name)))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
