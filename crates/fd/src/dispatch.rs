// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch decisions for one scheduler tick.
//!
//! Separated from process spawning so the whole policy is testable: the
//! supervisor turns the returned actions into forks, burst-fifo writes,
//! and slot updates.

use crate::queue::{Queue, QueueEntry};
use afd_core::SlotMarker;
use afd_statearea::Fsa;

/// One thing the supervisor should do for a queued entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    /// Spawn a fresh worker on a free slot.
    Fork { entry_index: usize, slot: usize },
    /// Hand the entry to the worker already connected on this slot.
    Burst { entry_index: usize, fsa_pos: usize, slot: usize, worker_pid: i32 },
    /// Tell the waiting worker its connection cannot serve the entry.
    Incompatible { fsa_pos: usize, slot: usize },
}

/// Decide what to do with every dispatchable entry right now.
pub fn dispatch_tick(queue: &Queue, fsa: &Fsa) -> Vec<DispatchAction> {
    let mut actions = Vec::new();
    for index in queue.dispatchable(fsa) {
        let entry = &queue.entries()[index];
        let Ok(host) = fsa.host(entry.fsa_pos) else { continue };

        if !entry.is_retrieve() {
            match burst_candidate(queue, entry, host) {
                Some((slot, pid, true)) => {
                    actions.push(DispatchAction::Burst {
                        entry_index: index,
                        fsa_pos: entry.fsa_pos,
                        slot,
                        worker_pid: pid,
                    });
                    continue;
                }
                Some((slot, _, false)) => {
                    actions.push(DispatchAction::Incompatible { fsa_pos: entry.fsa_pos, slot });
                    continue;
                }
                None => {}
            }
        }

        if let Some(slot) = host.free_slot() {
            actions.push(DispatchAction::Fork { entry_index: index, slot });
        }
    }
    actions
}

/// Find a worker waiting on this host and judge compatibility.
///
/// Returns (slot, pid, compatible). Compatibility follows the burst
/// rules on the destination: same port always, same target dir for scp,
/// same user for sftp.
fn burst_candidate(
    queue: &Queue,
    entry: &QueueEntry,
    host: &afd_statearea::HostRecord,
) -> Option<(usize, i32, bool)> {
    let (slot, waiting) = host.job_status.iter().enumerate().find(|(_, s)| {
        s.pid > 0
            && matches!(s.burst_marker(), SlotMarker::AwaitingJob | SlotMarker::IdleKeepAlive)
    })?;

    let new_job_id = Queue::job_id_of(&entry.msg_name).ok()?;
    let new_dest = &queue.message(new_job_id)?.destination;
    let current_dest = &queue.message(waiting.job_id)?.destination;
    Some((slot, waiting.pid, current_dest.burst_compatible(new_dest)))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
