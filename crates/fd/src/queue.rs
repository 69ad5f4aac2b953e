// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pending-job queue (QB) and the message cache (MDB).
//!
//! QB keeps enqueue order; the supervisor always dispatches the oldest
//! eligible entry of a host first. The MDB caches the static fields of
//! each job's message file, parsed once per job id.

use afd_core::{host_status, JobMessage, MsgError, WorkDir};
use afd_statearea::{Fsa, FsaError, LockDomain};
use indexmap::IndexMap;
use thiserror::Error;

/// Sentinel pid of a queued-but-undispatched entry.
pub const PENDING: i32 = -2;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Msg(#[from] MsgError),
    #[error(transparent)]
    Fsa(#[from] FsaError),
    #[error("spool scan failed for {msg_name}: {source}")]
    Spool {
        msg_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("message name `{0}` has no job id component")]
    BadMsgName(String),
    #[error("duplicate message name `{0}` in queue")]
    DuplicateMsgName(String),
}

/// One pending or running job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Path fragment locating the file set; empty for retrieve jobs.
    pub msg_name: String,
    /// MDB job id for send jobs, FRA position for retrieve jobs.
    pub pos: usize,
    /// [`PENDING`] until a worker owns the entry, then the worker pid.
    pub pid: i32,
    pub fsa_pos: usize,
    pub files_to_send: u32,
    pub file_size_to_send: u64,
    pub enqueued_at: i64,
}

impl QueueEntry {
    pub fn is_retrieve(&self) -> bool {
        self.msg_name.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pid == PENDING
    }
}

/// QB plus MDB, owned by the FD supervisor.
#[derive(Default)]
pub struct Queue {
    qb: Vec<QueueEntry>,
    mdb: IndexMap<u32, JobMessage>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.qb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qb.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.qb
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut QueueEntry> {
        self.qb.get_mut(index)
    }

    pub fn message(&self, job_id: u32) -> Option<&JobMessage> {
        self.mdb.get(&job_id)
    }

    /// Job id encoded as the first `/`-separated component of a message
    /// name.
    pub fn job_id_of(msg_name: &str) -> Result<u32, QueueError> {
        msg_name
            .split('/')
            .next()
            .and_then(|c| c.parse().ok())
            .ok_or_else(|| QueueError::BadMsgName(msg_name.to_string()))
    }

    /// Append a send job, caching its message on first sight and
    /// crediting the host's total counters.
    pub fn enqueue(
        &mut self,
        workdir: &WorkDir,
        fsa: &mut Fsa,
        msg_name: &str,
        now: i64,
    ) -> Result<(), QueueError> {
        if self.qb.iter().any(|e| !e.msg_name.is_empty() && e.msg_name == msg_name) {
            return Err(QueueError::DuplicateMsgName(msg_name.to_string()));
        }

        let job_id = Self::job_id_of(msg_name)?;
        if !self.mdb.contains_key(&job_id) {
            let msg = JobMessage::load(&workdir.msg_dir(), job_id)?;
            self.mdb.insert(job_id, msg);
        }
        let fsa_pos = self.mdb[&job_id].fsa_pos;

        let (files, bytes) = scan_spool(workdir, msg_name)?;
        fsa.with_host_lock(fsa_pos, LockDomain::Tfc, |host| {
            host.total_file_counter += files;
            host.total_file_size += bytes;
            host.jobs_queued += 1;
        })?;

        self.qb.push(QueueEntry {
            msg_name: msg_name.to_string(),
            pos: job_id as usize,
            pid: PENDING,
            fsa_pos,
            files_to_send: files,
            file_size_to_send: bytes,
            enqueued_at: now,
        });
        Ok(())
    }

    /// Append a retrieve job referencing an FRA row.
    pub fn enqueue_retrieve(&mut self, fra_pos: usize, fsa_pos: usize, now: i64) {
        if self.qb.iter().any(|e| e.is_retrieve() && e.pos == fra_pos) {
            return;
        }
        self.qb.push(QueueEntry {
            msg_name: String::new(),
            pos: fra_pos,
            pid: PENDING,
            fsa_pos,
            files_to_send: 0,
            file_size_to_send: 0,
            enqueued_at: now,
        });
    }

    /// Remove entry `index`; uncounts a still-pending entry from
    /// jobs_queued.
    pub fn remove(&mut self, index: usize, fsa: &mut Fsa) -> Result<QueueEntry, QueueError> {
        let entry = self.qb.remove(index);
        // A host that vanished in a reload has no counters left to fix.
        if entry.is_pending() && !entry.is_retrieve() && entry.fsa_pos < fsa.count() {
            fsa.with_host_lock(entry.fsa_pos, LockDomain::Tfc, |host| {
                host.jobs_queued = host.jobs_queued.saturating_sub(1);
            })?;
        }
        Ok(entry)
    }

    /// Mark entry `index` handed to worker `pid`.
    pub fn assign(&mut self, index: usize, pid: i32, fsa: &mut Fsa) -> Result<(), QueueError> {
        let (fsa_pos, was_pending, retrieve) = {
            let entry = &mut self.qb[index];
            let was = entry.is_pending();
            entry.pid = pid;
            (entry.fsa_pos, was, entry.is_retrieve())
        };
        if was_pending && !retrieve && fsa_pos < fsa.count() {
            fsa.with_host_lock(fsa_pos, LockDomain::Tfc, |host| {
                host.jobs_queued = host.jobs_queued.saturating_sub(1);
            })?;
        }
        Ok(())
    }

    /// Put a dispatched entry back to PENDING (failed worker).
    pub fn requeue(&mut self, index: usize, fsa: &mut Fsa) -> Result<(), QueueError> {
        let (fsa_pos, retrieve) = {
            let entry = &mut self.qb[index];
            entry.pid = PENDING;
            (entry.fsa_pos, entry.is_retrieve())
        };
        if !retrieve && fsa_pos < fsa.count() {
            fsa.with_host_lock(fsa_pos, LockDomain::Tfc, |host| {
                host.jobs_queued += 1;
            })?;
        }
        Ok(())
    }

    /// Indices of entries owned by worker `pid`.
    pub fn owned_by(&self, pid: i32) -> Vec<usize> {
        self.qb
            .iter()
            .enumerate()
            .filter(|(_, e)| e.pid == pid)
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the oldest pending entry for each host that can take
    /// more work right now.
    pub fn dispatchable(&self, fsa: &Fsa) -> Vec<usize> {
        let mut out = Vec::new();
        let mut seen_hosts = std::collections::HashSet::new();
        for (i, entry) in self.qb.iter().enumerate() {
            if !entry.is_pending() || !seen_hosts.insert(entry.fsa_pos) {
                continue;
            }
            let Ok(host) = fsa.host(entry.fsa_pos) else { continue };
            if host.active_transfers >= host.allowed_transfers {
                continue;
            }
            if host.host_status
                & (host_status::AUTO_PAUSE_QUEUE
                    | host_status::PAUSE_QUEUE
                    | host_status::STOP_TRANSFER)
                != 0
            {
                continue;
            }
            out.push(i);
        }
        out
    }
}

/// Count files and bytes of a job's spool directory.
fn scan_spool(workdir: &WorkDir, msg_name: &str) -> Result<(u32, u64), QueueError> {
    let dir = workdir.outgoing_dir().join(msg_name);
    let spool_err = |source| QueueError::Spool { msg_name: msg_name.to_string(), source };
    let mut files = 0u32;
    let mut bytes = 0u64;
    for entry in std::fs::read_dir(&dir).map_err(spool_err)? {
        let entry = entry.map_err(spool_err)?;
        let meta = entry.metadata().map_err(spool_err)?;
        if meta.is_file() {
            files += 1;
            bytes += meta.len();
        }
    }
    Ok((files, bytes))
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
