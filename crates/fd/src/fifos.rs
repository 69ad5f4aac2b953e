// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fifo paths owned by the FD supervisor and their creation.
//!
//! Fifos are created mode 0600 if absent and held open read-write by
//! the owning process so readers never see EOF.

use afd_core::WorkDir;
use nix::sys::stat::Mode;
use std::io;
use std::path::PathBuf;

/// Names of the fifos the FD side uses.
#[derive(Debug, Clone)]
pub struct FdFifos {
    /// Producer drops message names here.
    pub msg_fifo: PathBuf,
    /// Workers write their pid here when they finish.
    pub sf_fin_fifo: PathBuf,
    /// Single wake bytes, content ignored.
    pub wake_up_fifo: PathBuf,
    /// Delete commands (host / message / single file).
    pub delete_jobs_fifo: PathBuf,
    /// FSA positions whose rate-limit share must be recomputed.
    pub trl_calc_fifo: PathBuf,
    /// Control opcodes for the supervisor itself.
    pub fd_cmd_fifo: PathBuf,
}

impl FdFifos {
    pub fn new(workdir: &WorkDir) -> Self {
        let dir = workdir.fifo_dir();
        Self {
            msg_fifo: dir.join("msg.fifo"),
            sf_fin_fifo: dir.join("sf_fin.fifo"),
            wake_up_fifo: dir.join("fd_wake_up.fifo"),
            delete_jobs_fifo: dir.join("delete_jobs.fifo"),
            trl_calc_fifo: dir.join("trl_calc.fifo"),
            fd_cmd_fifo: dir.join("fd_cmd.fifo"),
        }
    }

    /// Create every fifo that does not exist yet.
    pub fn ensure(&self) -> io::Result<()> {
        for path in [
            &self.msg_fifo,
            &self.sf_fin_fifo,
            &self.wake_up_fifo,
            &self.delete_jobs_fifo,
            &self.trl_calc_fifo,
            &self.fd_cmd_fifo,
        ] {
            ensure_fifo(path)?;
        }
        Ok(())
    }
}

/// Path of the per-slot burst rendezvous fifo.
pub fn burst_fifo_path(workdir: &WorkDir, fsa_pos: usize, slot: usize) -> PathBuf {
    workdir.fifo_dir().join(format!("burst_{fsa_pos}_{slot}.fifo"))
}

/// Path of the retry fifo waking monitor probe `pos`.
pub fn retry_mon_fifo_path(workdir: &WorkDir, pos: usize) -> PathBuf {
    workdir.fifo_dir().join(format!("retry_mon.fifo.{pos}"))
}

/// mkfifo unless a fifo is already there.
pub fn ensure_fifo(path: &std::path::Path) -> io::Result<()> {
    match nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::EEXIST) => Ok(()),
        Err(e) => Err(io::Error::from(e)),
    }
}

/// Write a single wake byte, ignoring a full pipe.
///
/// Non-blocking so a dead supervisor cannot hang its workers.
pub fn write_wake_byte(path: &std::path::Path) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut f = std::fs::OpenOptions::new()
        .write(true)
        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
        .open(path)?;
    match f.write_all(&[b'w']) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
        Err(e) => Err(e),
    }
}
