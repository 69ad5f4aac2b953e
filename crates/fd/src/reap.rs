// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-exit bookkeeping.
//!
//! Every termination funnels through [`handle_worker_exit`], whether it
//! arrived via the SF_FIN fifo or the child-wait task. The function is
//! idempotent per pid: replaying a finish frame for an already-reaped
//! worker changes nothing.

use crate::queue::Queue;
use afd_core::{host_status, TransferExit};
use afd_statearea::{Fra, Fsa, FsaError, LockDomain};

/// What happened during one reap, for logging.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReapOutcome {
    /// Host position and slot the worker held, when still known.
    pub slot: Option<(usize, usize)>,
    /// Queue entries removed because the worker consumed them.
    pub removed_entries: usize,
    /// Queue entries put back to pending for a retry.
    pub requeued_entries: usize,
    /// The host's queue was auto-paused by this exit.
    pub auto_paused: bool,
}

/// Account for a finished worker.
pub fn handle_worker_exit(
    fsa: &mut Fsa,
    fra: Option<&mut Fra>,
    queue: &mut Queue,
    pid: i32,
    exit: TransferExit,
) -> Result<ReapOutcome, FsaError> {
    let mut outcome = ReapOutcome::default();
    let faulty = exit.counts_as_error();

    // Locate and clear the slot. A replayed notification finds nothing.
    let mut location = None;
    for pos in 0..fsa.count() {
        let found = fsa
            .host(pos)?
            .job_status
            .iter()
            .position(|s| s.pid == pid && pid > 0);
        if let Some(slot) = found {
            location = Some((pos, slot));
            break;
        }
    }

    if let Some((pos, slot)) = location {
        outcome.slot = Some((pos, slot));
        {
            let host = fsa.host_mut(pos)?;
            host.job_status[slot].reset(faulty);
            host.active_transfers = host.active_transfers.saturating_sub(1);
        }

        if faulty {
            let code = exit.code().clamp(0, 255) as u8;
            let (error_counter, max_errors) = fsa.with_host_lock(pos, LockDomain::Ec, |host| {
                host.error_counter += 1;
                host.push_error_history(code);
                (host.error_counter, host.max_errors)
            })?;
            if max_errors > 0 && error_counter >= max_errors {
                outcome.auto_paused = fsa.with_host_lock(pos, LockDomain::Hs, |host| {
                    let fresh = host.host_status & host_status::AUTO_PAUSE_QUEUE == 0;
                    host.host_status |= host_status::AUTO_PAUSE_QUEUE;
                    fresh
                })?;
            }
        }
    }

    // Settle the queue entries this worker owned.
    let owned = queue.owned_by(pid);
    let mut retrieve_dirs = Vec::new();
    if exit == TransferExit::Success {
        // Indices shift as we remove; walk from the back.
        for index in owned.into_iter().rev() {
            if let Some(entry) = queue.entries().get(index) {
                if entry.is_retrieve() {
                    retrieve_dirs.push(entry.pos);
                }
            }
            let _ = queue.remove(index, fsa);
            outcome.removed_entries += 1;
        }
    } else {
        for index in owned {
            if let Some(entry) = queue.entries().get(index) {
                if entry.is_retrieve() {
                    retrieve_dirs.push(entry.pos);
                }
            }
            if queue.requeue(index, fsa).is_ok() {
                outcome.requeued_entries += 1;
            }
        }
    }

    // Retrieve jobs release their FRA row; failures count there too.
    if let Some(fra) = fra {
        for dir_pos in retrieve_dirs {
            if let Ok(dir) = fra.dir_mut(dir_pos) {
                dir.queued = 0;
                if faulty {
                    dir.error_counter += 1;
                }
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
#[path = "reap_tests.rs"]
mod tests;
