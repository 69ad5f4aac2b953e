// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `afd_mon` supervisor: keeps one probe per configured remote AFD
//! alive and rebuilds the MSA when the config file changes.

use crate::active::{write_active_file, ActiveFile};
use crate::config::{eval_afd_mon_config, ConfigError};
use crate::process::{after_restart, may_restart, ProcessEntry};
use afd_core::{ConnectStatus, WorkDir, WorkDirError};
use afd_fd::fifos::ensure_fifo;
use afd_statearea::{MonConfigRow, Msa};
use afd_wire::{FifoCommand, FifoDecoder};
use fs2::FileExt;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum MonSupervisorError {
    #[error(transparent)]
    WorkDir(#[from] WorkDirError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Area(#[from] afd_statearea::AreaError),
    #[error("failed to acquire lock: afd_mon already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supervisor state for the probe fleet.
pub struct MonSupervisor {
    workdir: WorkDir,
    msa: Msa,
    rows: Vec<MonConfigRow>,
    pl: Vec<ProcessEntry>,
    children: HashMap<i32, usize>,
    config_mtime: SystemTime,
    exit_tx: mpsc::Sender<(i32, Option<i32>)>,
    exit_rx: Option<mpsc::Receiver<(i32, Option<i32>)>>,
    /// Held open read-write so acknowledges never block on a reader.
    resp_fifo: std::fs::File,
    probe_only_fifo: std::fs::File,
    // NOTE(lifetime): held to keep the exclusive daemon lock; released on drop
    #[allow(dead_code)]
    lock_file: std::fs::File,
}

impl MonSupervisor {
    pub fn start(workdir: WorkDir) -> Result<Self, MonSupervisorError> {
        workdir.ensure_layout()?;

        let lock_path = workdir.fifo_dir().join("afd_mon.pid");
        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.try_lock_exclusive().map_err(MonSupervisorError::LockFailed)?;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;

        ensure_fifo(&mon_cmd_fifo(&workdir))?;
        ensure_fifo(&mon_resp_fifo(&workdir))?;
        ensure_fifo(&probe_only_fifo(&workdir))?;
        let resp_fifo = open_fifo_rw(&mon_resp_fifo(&workdir))?;
        let probe_only = open_fifo_rw(&probe_only_fifo(&workdir))?;

        let config_path = workdir.afd_mon_config();
        let config_mtime = std::fs::metadata(&config_path)?.modified()?;
        let rows = eval_afd_mon_config(&config_path)?;
        let msa = Msa::create(&workdir.msa_file(), &rows)?;
        let pl = rows.iter().map(|r| ProcessEntry::new(r.alias.clone())).collect();

        let (exit_tx, exit_rx) = mpsc::channel(32);
        tracing::info!(afds = rows.len(), "=================> STARTUP <=================");
        Ok(Self {
            workdir,
            msa,
            rows,
            pl,
            children: HashMap::new(),
            config_mtime,
            exit_tx,
            exit_rx: Some(exit_rx),
            resp_fifo,
            probe_only_fifo: probe_only,
            lock_file,
        })
    }

    /// Main loop; returns after a shutdown command.
    pub async fn run(&mut self) -> Result<(), MonSupervisorError> {
        let mut exit_rx = match self.exit_rx.take() {
            Some(rx) => rx,
            None => return Ok(()),
        };
        self.start_all();
        self.write_active()?;

        let mut cmd_rx = open_receiver(&mon_cmd_fifo(&self.workdir))?;
        let mut cmd_decoder = FifoDecoder::new();
        let mut cmd_buf = [0u8; 512];
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(10));

        loop {
            tokio::select! {
                n = cmd_rx.read(&mut cmd_buf) => {
                    let n = n?;
                    for cmd in cmd_decoder.feed(&cmd_buf[..n]) {
                        if self.handle_command(cmd) {
                            self.shutdown(true);
                            return Ok(());
                        }
                    }
                }
                Some((pid, code)) = exit_rx.recv() => {
                    self.on_probe_exit(pid, code);
                    self.write_active()?;
                }
                _ = tick.tick() => {
                    self.check_config()?;
                }
            }
        }
    }

    /// True means shutdown.
    fn handle_command(&mut self, cmd: FifoCommand) -> bool {
        match cmd {
            FifoCommand::Shutdown => return true,
            FifoCommand::IsAlive => {
                let bytes = FifoCommand::Ackn.encode();
                if let Err(e) = (&self.probe_only_fifo).write_all(&bytes) {
                    tracing::error!(error = %e, "was not able to send acknowledge via fifo");
                }
            }
            FifoCommand::DisableMon(pos) => {
                if pos < self.pl.len() {
                    if let Ok(row) = self.msa.row_mut(pos) {
                        row.set_connect_status(ConnectStatus::Disabled);
                    }
                    self.stop_probe(pos);
                    let _ = self.write_active();
                }
            }
            FifoCommand::EnableMon(pos) => {
                if pos < self.pl.len() && self.pl[pos].pid == 0 {
                    let disabled = self
                        .msa
                        .row(pos)
                        .map(|r| r.connect_status() == ConnectStatus::Disabled)
                        .unwrap_or(false);
                    if disabled {
                        if let Ok(row) = self.msa.row_mut(pos) {
                            row.set_connect_status(ConnectStatus::Disconnected);
                        }
                        self.start_probe(pos);
                        let _ = self.write_active();
                    }
                }
            }
            other => {
                tracing::warn!(?other, "unexpected opcode on monitor command fifo");
            }
        }
        false
    }

    /// Re-evaluate the config if its mtime moved, restarting only the
    /// probes whose row identity changed.
    fn check_config(&mut self) -> Result<(), MonSupervisorError> {
        let mtime = std::fs::metadata(self.workdir.afd_mon_config())?.modified()?;
        if mtime == self.config_mtime {
            return Ok(());
        }
        tracing::info!("Rereading AFD_MON_CONFIG");
        self.config_mtime = mtime;
        let new_rows = eval_afd_mon_config(&self.workdir.afd_mon_config())?;

        // Probes keep running only when position and identity both hold.
        let mut kept: Vec<Option<ProcessEntry>> = vec![None; new_rows.len()];
        for (pos, entry) in self.pl.iter_mut().enumerate() {
            let unchanged = new_rows
                .get(pos)
                .map(|n| n.probe_tuple() == self.rows[pos].probe_tuple())
                .unwrap_or(false);
            if unchanged {
                kept[pos] = Some(entry.clone());
            } else if entry.pid > 0 {
                let _ = kill(Pid::from_raw(entry.pid), Signal::SIGINT);
                self.children.remove(&entry.pid);
                entry.pid = 0;
            }
        }

        self.msa = Msa::create(&self.workdir.msa_file(), &new_rows)?;
        self.pl = new_rows
            .iter()
            .enumerate()
            .map(|(pos, row)| {
                kept[pos].take().unwrap_or_else(|| ProcessEntry::new(row.alias.clone()))
            })
            .collect();
        self.children.retain(|_, pos| *pos < self.pl.len());
        self.rows = new_rows;

        self.start_all();
        self.write_active()?;
        Ok(())
    }

    fn start_all(&mut self) {
        for pos in 0..self.pl.len() {
            let disabled = self
                .msa
                .row(pos)
                .map(|r| r.connect_status() == ConnectStatus::Disabled)
                .unwrap_or(false);
            if self.pl[pos].pid == 0 && !disabled {
                self.start_probe(pos);
            }
        }
    }

    fn start_probe(&mut self, pos: usize) {
        let exe = probe_exe();
        let spawned = tokio::process::Command::new(&exe)
            .arg("-w")
            .arg(self.workdir.root())
            .arg(pos.to_string())
            .spawn();
        match spawned {
            Ok(child) => {
                let pid = child.id().map(|p| p as i32).unwrap_or(0);
                self.pl[pos].pid = pid;
                self.pl[pos].start_time = now_epoch();
                self.children.insert(pid, pos);
                let tx = self.exit_tx.clone();
                let mut child = child;
                tokio::spawn(async move {
                    let code = child.wait().await.ok().and_then(|s| s.code());
                    let _ = tx.send((pid, code)).await;
                });
                tracing::info!(pos, pid, alias = %self.pl[pos].alias, "probe started");
            }
            Err(e) => {
                tracing::error!(pos, error = %e, "could not start probe");
            }
        }
    }

    fn stop_probe(&mut self, pos: usize) {
        let pid = self.pl[pos].pid;
        if pid > 0 {
            let _ = kill(Pid::from_raw(pid), Signal::SIGINT);
            self.children.remove(&pid);
            self.pl[pos].pid = 0;
        }
    }

    fn on_probe_exit(&mut self, pid: i32, code: Option<i32>) {
        let Some(pos) = self.children.remove(&pid) else { return };
        if pos >= self.pl.len() {
            return;
        }
        self.pl[pos].pid = 0;

        if code == Some(0) {
            self.pl[pos].start_time = 0;
            self.pl[pos].number_of_restarts = 0;
            return;
        }
        tracing::warn!(pid, alias = %self.pl[pos].alias, ?code,
            "abnormal termination of probe");

        let disabled = self
            .msa
            .row(pos)
            .map(|r| r.connect_status() == ConnectStatus::Disabled)
            .unwrap_or(false);
        if disabled {
            return;
        }
        let restarts = self.pl[pos].number_of_restarts;
        if may_restart(restarts) {
            let started_at = self.pl[pos].start_time;
            self.start_probe(pos);
            self.pl[pos].number_of_restarts = after_restart(restarts, started_at, now_epoch());
        } else {
            tracing::error!(alias = %self.pl[pos].alias,
                "to many restarts of probe, will NOT try to start it again");
        }
    }

    fn write_active(&self) -> Result<(), MonSupervisorError> {
        let active = ActiveFile {
            supervisor_pid: std::process::id() as i32,
            probe_pids: self.pl.iter().map(|e| e.pid).collect(),
        };
        write_active_file(&self.workdir.mon_active_file(), &active)
            .map_err(|e| MonSupervisorError::Io(std::io::Error::other(e.to_string())))
    }

    fn shutdown(&mut self, acknowledge: bool) {
        tracing::info!("=================> SHUTDOWN <=================");
        for pos in 0..self.pl.len() {
            self.stop_probe(pos);
        }
        let _ = std::fs::remove_file(self.workdir.mon_active_file());
        let _ = std::fs::remove_file(self.workdir.fifo_dir().join("afd_mon.pid"));
        if acknowledge {
            let bytes = FifoCommand::Ackn.encode();
            if let Err(e) = (&self.resp_fifo).write_all(&bytes) {
                tracing::warn!(error = %e, "failed to send shutdown acknowledge");
            }
        }
    }
}

pub fn mon_cmd_fifo(workdir: &WorkDir) -> PathBuf {
    workdir.fifo_dir().join("afd_mon_cmd.fifo")
}

pub fn mon_resp_fifo(workdir: &WorkDir) -> PathBuf {
    workdir.fifo_dir().join("afd_mon_resp.fifo")
}

pub fn probe_only_fifo(workdir: &WorkDir) -> PathBuf {
    workdir.fifo_dir().join("afd_mon_probe_only.fifo")
}

fn open_fifo_rw(path: &std::path::Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new().read(true).write(true).open(path)
}

fn open_receiver(path: &std::path::Path) -> Result<pipe::Receiver, MonSupervisorError> {
    Ok(pipe::OpenOptions::new().read_write(true).open_receiver(path)?)
}

fn probe_exe() -> PathBuf {
    if let Some(dir) = std::env::var_os("AFD_BIN_DIR") {
        return PathBuf::from(dir).join("mon");
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("mon")))
        .unwrap_or_else(|| PathBuf::from("mon"))
}

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
