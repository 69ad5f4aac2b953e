// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The FD supervisor: fifo multiplexing, dispatch, and reaping.
//!
//! Async is used only to multiplex the fifos and child exits; all state
//! mutation happens inline on this single task. Workers are separate
//! blocking processes.

use crate::burst::BurstAnswer;
use crate::delete::apply_delete;
use crate::dispatch::{dispatch_tick, DispatchAction};
use crate::fifos::{burst_fifo_path, FdFifos};
use crate::queue::{Queue, QueueError};
use crate::reap::handle_worker_exit;
use afd_core::{Clock, ConnectStatus, SystemClock, TransferExit, WorkDir, WorkDirError};
use afd_statearea::{Fra, Fsa, FsaError};
use afd_wire::{DeleteDecoder, FifoCommand, FifoDecoder, I32FrameDecoder};
use fs2::FileExt;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::io::Write as _;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    WorkDir(#[from] WorkDirError),
    #[error("failed to acquire lock: fd already running?")]
    LockFailed(#[source] std::io::Error),
    #[error(transparent)]
    Fsa(#[from] FsaError),
    #[error(transparent)]
    Area(#[from] afd_statearea::AreaError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The FD process state.
pub struct Supervisor {
    workdir: WorkDir,
    fifos: FdFifos,
    fsa: Fsa,
    fra: Option<Fra>,
    /// Dir aliases of the attached FRA, for retrieve-list cleanup when
    /// a reload drops a directory.
    fra_aliases: Vec<String>,
    queue: Queue,
    /// Live worker pids; removal is what makes reaping idempotent.
    children: HashMap<i32, ()>,
    exit_tx: mpsc::Sender<(i32, Option<i32>)>,
    exit_rx: Option<mpsc::Receiver<(i32, Option<i32>)>>,
    clock: SystemClock,
    // NOTE(lifetime): held to keep the exclusive daemon lock; released on drop
    #[allow(dead_code)]
    lock_file: std::fs::File,
}

impl Supervisor {
    /// Initialize state: lock file, directory layout, fifos, areas.
    pub fn start(workdir: WorkDir) -> Result<Self, SupervisorError> {
        workdir.ensure_layout()?;

        let lock_path = workdir.fifo_dir().join("fd.pid");
        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.try_lock_exclusive().map_err(SupervisorError::LockFailed)?;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;

        let fifos = FdFifos::new(&workdir);
        fifos.ensure()?;

        let fsa = if workdir.fsa_file().exists() {
            Fsa::attach(&workdir.fsa_file())?
        } else {
            tracing::warn!("no FSA present, starting with an empty host table");
            Fsa::create(&workdir.fsa_file(), &[])?
        };
        let fra = if workdir.fra_file().exists() {
            Some(Fra::attach(&workdir.fra_file())?)
        } else {
            None
        };
        let fra_aliases = fra.as_ref().map(fra_aliases).unwrap_or_default();

        let (exit_tx, exit_rx) = mpsc::channel(64);
        tracing::info!(workdir = %workdir.root().display(), hosts = fsa.count(), "FD started");
        Ok(Self {
            workdir,
            fifos,
            fsa,
            fra,
            fra_aliases,
            queue: Queue::new(),
            children: HashMap::new(),
            exit_tx,
            exit_rx: Some(exit_rx),
            clock: SystemClock,
            lock_file,
        })
    }

    /// Main loop; returns after a shutdown command.
    pub async fn run(&mut self) -> Result<(), SupervisorError> {
        // The exit channel moves out of self so select! handlers can
        // borrow the rest of the state.
        let mut exit_rx = match self.exit_rx.take() {
            Some(rx) => rx,
            None => return Ok(()),
        };
        let mut msg_rx = open_receiver(&self.fifos.msg_fifo)?;
        let mut fin_rx = open_receiver(&self.fifos.sf_fin_fifo)?;
        let mut wake_rx = open_receiver(&self.fifos.wake_up_fifo)?;
        let mut delete_rx = open_receiver(&self.fifos.delete_jobs_fifo)?;
        let mut trl_rx = open_receiver(&self.fifos.trl_calc_fifo)?;
        let mut cmd_rx = open_receiver(&self.fifos.fd_cmd_fifo)?;

        let mut msg_carry: Vec<u8> = Vec::new();
        let mut fin_decoder = I32FrameDecoder::new();
        let mut delete_decoder = DeleteDecoder::new();
        let mut trl_decoder = I32FrameDecoder::new();
        let mut cmd_decoder = FifoDecoder::new();

        let mut tick = tokio::time::interval(std::time::Duration::from_secs(1));
        let mut msg_buf = [0u8; 4096];
        let mut fin_buf = [0u8; 512];
        let mut wake_buf = [0u8; 512];
        let mut delete_buf = [0u8; 4096];
        let mut trl_buf = [0u8; 512];
        let mut cmd_buf = [0u8; 512];

        loop {
            tokio::select! {
                n = msg_rx.read(&mut msg_buf) => {
                    let n = n?;
                    msg_carry.extend_from_slice(&msg_buf[..n]);
                    self.drain_msg_names(&mut msg_carry);
                    self.dispatch();
                }
                n = fin_rx.read(&mut fin_buf) => {
                    let n = n?;
                    for pid in fin_decoder.feed(&fin_buf[..n]) {
                        // The wait task delivers the real exit status;
                        // the frame is an early wake. Unknown pids are
                        // replays and ignored.
                        if self.children.contains_key(&pid) {
                            tracing::debug!(pid, "finish frame received");
                        }
                    }
                    self.dispatch();
                }
                n = wake_rx.read(&mut wake_buf) => {
                    let _ = n?;
                    self.dispatch();
                }
                n = delete_rx.read(&mut delete_buf) => {
                    let n = n?;
                    for cmd in delete_decoder.feed(&delete_buf[..n]) {
                        let children = &mut self.children;
                        let outcome = apply_delete(
                            &self.workdir,
                            &mut self.fsa,
                            &mut self.queue,
                            &cmd,
                            |pid| {
                                children.remove(&pid);
                                let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
                            },
                        )?;
                        tracing::info!(?cmd, ?outcome, "delete command applied");
                    }
                }
                n = trl_rx.read(&mut trl_buf) => {
                    let n = n?;
                    for pos in trl_decoder.feed(&trl_buf[..n]) {
                        self.recalc_trl(pos.max(0) as usize);
                    }
                }
                n = cmd_rx.read(&mut cmd_buf) => {
                    let n = n?;
                    for cmd in cmd_decoder.feed(&cmd_buf[..n]) {
                        if self.handle_command(cmd) {
                            self.shutdown();
                            return Ok(());
                        }
                    }
                }
                Some((pid, code)) = exit_rx.recv() => {
                    self.reap(pid, code);
                    self.dispatch();
                }
                _ = tick.tick() => {
                    self.check_areas()?;
                    self.schedule_retrieves();
                    self.dispatch();
                }
            }
        }
    }

    /// Message names arrive NUL- or newline-terminated on the msg fifo.
    fn drain_msg_names(&mut self, carry: &mut Vec<u8>) {
        while let Some(end) = carry.iter().position(|b| *b == 0 || *b == b'\n') {
            let raw: Vec<u8> = carry.drain(..=end).collect();
            let name = String::from_utf8_lossy(&raw[..raw.len() - 1]).trim().to_string();
            if name.is_empty() {
                continue;
            }
            let now = self.clock.epoch_secs();
            match self.queue.enqueue(&self.workdir, &mut self.fsa, &name, now) {
                Ok(()) => tracing::info!(msg_name = %name, "job queued"),
                Err(e) => tracing::warn!(msg_name = %name, error = %e, "enqueue failed"),
            }
        }
    }

    /// True means shutdown.
    fn handle_command(&mut self, cmd: FifoCommand) -> bool {
        match cmd {
            FifoCommand::Shutdown => return true,
            FifoCommand::IsAlive => {
                // Liveness is answered over the wake fifo; any byte is
                // an acknowledgement for the prober.
                let _ = crate::fifos::write_wake_byte(&self.fifos.wake_up_fifo);
            }
            FifoCommand::EnableHost(alias) => {
                if let Some(pos) = self.fsa.position_of(&alias) {
                    let _ = self.fsa.with_host_lock(pos, afd_statearea::LockDomain::Hs, |h| {
                        h.host_status &= !(afd_core::host_status::PAUSE_QUEUE
                            | afd_core::host_status::STOP_TRANSFER);
                    });
                }
            }
            FifoCommand::DisableHost(alias) => {
                if let Some(pos) = self.fsa.position_of(&alias) {
                    let _ = self.fsa.with_host_lock(pos, afd_statearea::LockDomain::Hs, |h| {
                        h.host_status |= afd_core::host_status::STOP_TRANSFER;
                    });
                }
            }
            FifoCommand::RetryHost(alias) => {
                if let Some(pos) = self.fsa.position_of(&alias) {
                    let _ = self.fsa.with_host_lock(pos, afd_statearea::LockDomain::Ec, |h| {
                        h.error_counter = 0;
                    });
                    let _ = self.fsa.with_host_lock(pos, afd_statearea::LockDomain::Hs, |h| {
                        h.host_status &= !afd_core::host_status::AUTO_PAUSE_QUEUE;
                    });
                }
            }
            FifoCommand::Ackn | FifoCommand::DisableMon(_) | FifoCommand::EnableMon(_) => {
                tracing::warn!(?cmd, "monitor opcode on FD fifo, ignoring");
            }
        }
        false
    }

    fn recalc_trl(&mut self, pos: usize) {
        if let Ok(host) = self.fsa.host_mut(pos) {
            let share = host.transfer_rate_limit / u64::from(host.active_transfers.max(1));
            host.trl_per_process = share;
        }
    }

    /// Re-attach after a configuration-management swap.
    fn check_areas(&mut self) -> Result<(), SupervisorError> {
        if self.fsa.is_stale() {
            tracing::info!("FSA is stale, re-attaching");
            // A swap caught mid-rename leaves the new file stale too;
            // try again on the next tick rather than dying.
            match Fsa::attach(&self.workdir.fsa_file()) {
                Ok(fresh) => self.fsa = fresh,
                Err(e) => {
                    tracing::warn!(error = %e, "FSA re-attach failed, retrying next tick");
                    return Ok(());
                }
            }
            let count = self.fsa.count();
            let doomed: Vec<usize> = (0..self.queue.len())
                .filter(|i| self.queue.entries()[*i].fsa_pos >= count)
                .collect();
            for index in doomed.into_iter().rev() {
                let entry = self.queue.remove(index, &mut self.fsa)?;
                tracing::warn!(msg_name = %entry.msg_name, "host gone after reload, dropping job");
            }
        }
        let fra_stale = self.fra.as_ref().map(Fra::is_stale).unwrap_or(false);
        if fra_stale {
            tracing::info!("FRA is stale, re-attaching");
            let fresh = match Fra::attach(&self.workdir.fra_file()) {
                Ok(fresh) => fresh,
                Err(e) => {
                    tracing::warn!(error = %e, "FRA re-attach failed, retrying next tick");
                    return Ok(());
                }
            };
            // Directories that left the FRA take their retrieve lists
            // with them.
            for alias in &self.fra_aliases {
                if fresh.position_of(alias).is_none() {
                    if let Err(e) = afd_statearea::RetrieveList::remove(
                        &self.workdir.ls_data_dir(),
                        alias,
                    ) {
                        tracing::warn!(%alias, error = %e, "stale retrieve list not removed");
                    }
                }
            }
            self.fra_aliases = fra_aliases(&fresh);
            self.fra = Some(fresh);
        } else if self.fra.is_none() && self.workdir.fra_file().exists() {
            self.fra = Fra::attach(&self.workdir.fra_file()).ok();
            self.fra_aliases =
                self.fra.as_ref().map(fra_aliases).unwrap_or_default();
        }
        Ok(())
    }

    /// Synthesize retrieve jobs for fetch dirs whose check is due.
    fn schedule_retrieves(&mut self) {
        let now = self.clock.epoch_secs();
        let Some(fra) = &mut self.fra else { return };
        for pos in fra.due(now) {
            let Ok(dir) = fra.dir_mut(pos) else { continue };
            let fsa_pos = dir.fsa_pos;
            if fsa_pos < 0 {
                continue;
            }
            dir.queued = 1;
            dir.next_check_time = now + i64::from(dir.poll_interval);
            self.queue.enqueue_retrieve(pos, fsa_pos as usize, now);
            tracing::debug!(dir = pos, "retrieve job synthesized");
        }
    }

    /// Turn this tick's dispatch decisions into forks and fifo writes.
    fn dispatch(&mut self) {
        let actions = dispatch_tick(&self.queue, &self.fsa);
        for action in actions {
            match action {
                DispatchAction::Fork { entry_index, slot } => {
                    if let Err(e) = self.fork_worker(entry_index, slot) {
                        tracing::error!(error = %e, "worker fork failed");
                    }
                }
                DispatchAction::Burst { entry_index, fsa_pos, slot, worker_pid } => {
                    let entry = self.queue.entries()[entry_index].clone();
                    let fifo = burst_fifo_path(&self.workdir, fsa_pos, slot);
                    // Non-blocking: a worker that died since the tick
                    // leaves no reader, and the open must not hang.
                    let written = std::fs::OpenOptions::new()
                        .write(true)
                        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
                        .open(&fifo)
                        .and_then(|mut f| {
                            f.write_all(&BurstAnswer::Job(entry.msg_name.clone()).encode())
                        });
                    match written {
                        Ok(()) => {
                            if let Ok(job_id) = Queue::job_id_of(&entry.msg_name) {
                                if let Ok(host) = self.fsa.host_mut(fsa_pos) {
                                    host.job_status[slot].job_id = job_id;
                                    host.job_status[slot].set_msg_name(&entry.msg_name);
                                }
                            }
                            let _ = self.queue.assign(entry_index, worker_pid, &mut self.fsa);
                            tracing::info!(msg_name = %entry.msg_name, worker_pid, "burst handover");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "burst fifo write failed, will fork later");
                        }
                    }
                }
                DispatchAction::Incompatible { fsa_pos, slot } => {
                    let fifo = burst_fifo_path(&self.workdir, fsa_pos, slot);
                    let _ = std::fs::OpenOptions::new()
                        .write(true)
                        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
                        .open(&fifo)
                        .and_then(|mut f| f.write_all(&BurstAnswer::Incompatible.encode()));
                    tracing::info!(fsa_pos, slot, "sent incompatible marker to waiting worker");
                }
            }
        }
    }

    fn fork_worker(&mut self, entry_index: usize, slot: usize) -> Result<(), SupervisorError> {
        let entry = self.queue.entries()[entry_index].clone();
        let (exe, last_arg) = if entry.is_retrieve() {
            let alias = self
                .fra
                .as_ref()
                .and_then(|fra| fra.dir(entry.pos).ok().map(|d| d.dir_alias().to_string()))
                .unwrap_or_default();
            (worker_exe("gf_loc"), alias)
        } else {
            (worker_exe("sf_loc"), entry.msg_name.clone())
        };

        let child = tokio::process::Command::new(&exe)
            .arg(self.workdir.root())
            .arg(slot.to_string())
            .arg("0")
            .arg(entry.fsa_pos.to_string())
            .arg(&last_arg)
            .spawn()?;
        let pid = child.id().map(|p| p as i32).unwrap_or(0);
        if pid == 0 {
            return Err(SupervisorError::Io(std::io::Error::other("spawned child has no pid")));
        }

        {
            let host = self.fsa.host_mut(entry.fsa_pos)?;
            let s = &mut host.job_status[slot];
            s.pid = pid;
            s.set_connect_status(ConnectStatus::Connecting);
            s.no_of_files = entry.files_to_send;
            s.file_size = entry.file_size_to_send;
            s.set_msg_name(&entry.msg_name);
            if !entry.is_retrieve() {
                if let Ok(job_id) = Queue::job_id_of(&entry.msg_name) {
                    s.job_id = job_id;
                }
            }
            host.active_transfers += 1;
            host.connections += 1;
            host.last_connection = self.clock.epoch_secs();
        }
        self.queue.assign(entry_index, pid, &mut self.fsa)?;
        self.children.insert(pid, ());

        let tx = self.exit_tx.clone();
        let mut child = child;
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(_) => None,
            };
            let _ = tx.send((pid, code)).await;
        });

        tracing::info!(pid, exe = %exe.display(), arg = %last_arg, slot, "worker forked");
        Ok(())
    }

    fn reap(&mut self, pid: i32, code: Option<i32>) {
        if self.children.remove(&pid).is_none() {
            return;
        }
        let exit = match code {
            Some(c) => TransferExit::from_code(c),
            // Signaled exit: treated as killed.
            None => TransferExit::GotKilled,
        };
        match handle_worker_exit(&mut self.fsa, self.fra.as_mut(), &mut self.queue, pid, exit) {
            Ok(outcome) => {
                tracing::info!(pid, %exit, ?outcome, "worker reaped");
            }
            Err(e) => tracing::error!(pid, error = %e, "reap bookkeeping failed"),
        }
    }

    fn shutdown(&mut self) {
        tracing::info!("FD shutting down");
        for pid in self.children.keys() {
            let _ = kill(Pid::from_raw(*pid), Signal::SIGTERM);
        }
        let _ = std::fs::remove_file(self.workdir.fifo_dir().join("fd.pid"));
    }
}

/// Worker executables live next to the supervisor binary; an explicit
/// override helps tests and packaging.
fn worker_exe(name: &str) -> PathBuf {
    if let Some(dir) = std::env::var_os("AFD_BIN_DIR") {
        return PathBuf::from(dir).join(name);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join(name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

fn fra_aliases(fra: &Fra) -> Vec<String> {
    (0..fra.count())
        .filter_map(|p| fra.dir(p).ok().map(|d| d.dir_alias().to_string()))
        .collect()
}

fn open_receiver(path: &std::path::Path) -> Result<pipe::Receiver, SupervisorError> {
    Ok(pipe::OpenOptions::new().read_write(true).open_receiver(path)?)
}
