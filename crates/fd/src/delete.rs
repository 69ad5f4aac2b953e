// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delete-fifo command execution.
//!
//! Deleting by host kills every worker serving that host, purges the
//! spooled files of each of its jobs, and clears the host's aggregate
//! state. Deleting a single file is allowed only while the owning job is
//! still pending.

use crate::queue::{Queue, QueueError};
use afd_core::{ConnectStatus, WorkDir};
use afd_statearea::{Fsa, LockDomain};
use afd_wire::DeleteCommand;

/// What a delete did, for the log line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub killed_pids: Vec<i32>,
    pub removed_entries: usize,
    pub removed_files: u32,
    pub removed_bytes: u64,
}

/// Apply one delete command.
///
/// `kill` delivers SIGKILL; injected so the policy is testable without
/// real processes.
pub fn apply_delete(
    workdir: &WorkDir,
    fsa: &mut Fsa,
    queue: &mut Queue,
    cmd: &DeleteCommand,
    mut kill: impl FnMut(i32),
) -> Result<DeleteOutcome, QueueError> {
    let mut outcome = DeleteOutcome::default();
    match cmd {
        DeleteCommand::AllJobsFromHost(alias) => {
            let Some(pos) = fsa.position_of(alias) else {
                tracing::warn!(%alias, "delete for unknown host, ignoring");
                return Ok(outcome);
            };

            let doomed: Vec<usize> = (0..queue.len())
                .filter(|i| queue.entries()[*i].fsa_pos == pos)
                .collect();
            for index in doomed.into_iter().rev() {
                let entry = queue.remove(index, fsa)?;
                if entry.pid > 0 {
                    kill(entry.pid);
                    outcome.killed_pids.push(entry.pid);
                }
                if !entry.is_retrieve() {
                    purge_spool(workdir, &entry.msg_name, &mut outcome);
                }
                outcome.removed_entries += 1;
            }

            // Also take down waiting workers not holding a queue entry.
            let waiting: Vec<i32> = fsa
                .host(pos)?
                .job_status
                .iter()
                .filter(|s| s.pid > 0)
                .map(|s| s.pid)
                .collect();
            for pid in waiting {
                if !outcome.killed_pids.contains(&pid) {
                    kill(pid);
                    outcome.killed_pids.push(pid);
                }
            }

            fsa.with_host_lock(pos, LockDomain::Tfc, |host| {
                host.total_file_counter = 0;
                host.total_file_size = 0;
                host.jobs_queued = 0;
            })?;
            fsa.with_host_lock(pos, LockDomain::Ec, |host| {
                host.error_counter = 0;
                host.error_history.fill(0);
            })?;
            let host = fsa.host_mut(pos)?;
            host.active_transfers = 0;
            for slot in host.job_status.iter_mut() {
                slot.reset(false);
                slot.set_connect_status(ConnectStatus::Disconnect);
            }
        }

        DeleteCommand::Message(msg_name) => {
            let Some(index) = queue
                .entries()
                .iter()
                .position(|e| !e.msg_name.is_empty() && e.msg_name == *msg_name)
            else {
                tracing::warn!(%msg_name, "delete for unknown message, ignoring");
                return Ok(outcome);
            };
            let entry = queue.remove(index, fsa)?;
            if entry.pid > 0 {
                kill(entry.pid);
                outcome.killed_pids.push(entry.pid);
            }
            fsa.with_host_lock(entry.fsa_pos, LockDomain::Tfc, |host| {
                host.total_file_counter =
                    host.total_file_counter.saturating_sub(entry.files_to_send);
                host.total_file_size =
                    host.total_file_size.saturating_sub(entry.file_size_to_send);
            })?;
            purge_spool(workdir, &entry.msg_name, &mut outcome);
            outcome.removed_entries += 1;
        }

        DeleteCommand::SingleFile(payload) => {
            // Payload: <msg_name>|<file_name>. Anything else is garbage
            // the producer wrote; drop it with a warning.
            let Some((msg_name, file_name)) = payload.split_once('|') else {
                tracing::warn!(%payload, "malformed single-file delete, dropping");
                return Ok(outcome);
            };
            let Some(index) =
                queue.entries().iter().position(|e| e.msg_name == msg_name)
            else {
                tracing::warn!(%msg_name, "single-file delete for unknown message, ignoring");
                return Ok(outcome);
            };
            if !queue.entries()[index].is_pending() {
                tracing::warn!(%msg_name, "single-file delete while job is running, ignoring");
                return Ok(outcome);
            }

            let path = workdir.outgoing_dir().join(msg_name).join(file_name);
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if std::fs::remove_file(&path).is_err() {
                tracing::warn!(path = %path.display(), "single-file delete found nothing");
                return Ok(outcome);
            }
            outcome.removed_files = 1;
            outcome.removed_bytes = size;

            let (fsa_pos, empty) = {
                let entry = match queue.entry_mut(index) {
                    Some(e) => e,
                    None => return Ok(outcome),
                };
                entry.files_to_send = entry.files_to_send.saturating_sub(1);
                entry.file_size_to_send = entry.file_size_to_send.saturating_sub(size);
                (entry.fsa_pos, entry.files_to_send == 0)
            };
            fsa.with_host_lock(fsa_pos, LockDomain::Tfc, |host| {
                host.total_file_counter = host.total_file_counter.saturating_sub(1);
                host.total_file_size = host.total_file_size.saturating_sub(size);
            })?;
            if empty {
                queue.remove(index, fsa)?;
                outcome.removed_entries += 1;
            }
        }
    }
    Ok(outcome)
}

fn purge_spool(workdir: &WorkDir, msg_name: &str, outcome: &mut DeleteOutcome) {
    let dir = workdir.outgoing_dir().join(msg_name);
    if let Ok(entries) = std::fs::read_dir(&dir) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                if meta.is_file() {
                    outcome.removed_files += 1;
                    outcome.removed_bytes += meta.len();
                }
            }
        }
    }
    if let Err(e) = std::fs::remove_dir_all(&dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to purge spool dir");
        }
    }
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
