// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker side of the burst rendezvous.
//!
//! After its last file, a worker that may keep its connection publishes
//! a slot marker, nudges the supervisor over the wake fifo, and blocks
//! on its per-slot fifo until an answer or the deadline arrives.

use crate::burst::{burst_deadline, BurstAnswer, BurstDecoder};
use crate::fifos::{burst_fifo_path, ensure_fifo, write_wake_byte, FdFifos};
use afd_core::{SlotMarker, WorkDir};
use afd_statearea::FsaSingle;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::Read;
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::time::Instant;

/// Outcome of one burst wait.
#[derive(Debug, PartialEq, Eq)]
pub enum BurstWait {
    /// The supervisor handed over another message for this connection.
    NewJob(String),
    /// Incompatible job, deadline, or error: disconnect and exit.
    Exit,
}

/// Block until the supervisor answers or the deadline passes.
pub fn wait_for_burst(
    workdir: &WorkDir,
    fsa: &mut FsaSingle,
    slot: usize,
    jobs_waiting: bool,
) -> BurstWait {
    let (keep_connected, transfer_timeout) = match fsa.host() {
        Ok(host) => (host.keep_connected, host.transfer_timeout),
        Err(_) => return BurstWait::Exit,
    };
    let marker =
        if jobs_waiting { SlotMarker::AwaitingJob } else { SlotMarker::IdleKeepAlive };

    let fifo = burst_fifo_path(workdir, fsa.pos(), slot);
    if ensure_fifo(&fifo).is_err() {
        return BurstWait::Exit;
    }
    let file = match std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc_o_nonblock())
        .open(&fifo)
    {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(fifo = %fifo.display(), error = %e, "cannot open burst fifo");
            return BurstWait::Exit;
        }
    };

    if let Ok(host) = fsa.host_mut() {
        host.job_status[slot].set_burst_marker(marker);
    }
    let _ = write_wake_byte(&FdFifos::new(workdir).wake_up_fifo);

    let deadline = burst_deadline(keep_connected, transfer_timeout);
    let started = Instant::now();
    let mut decoder = BurstDecoder::new();
    let mut file = file;

    let answer = loop {
        let remaining = deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break None;
        }
        let millis = remaining.as_millis().min(i32::MAX as u128) as i32;
        let timeout = PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX);
        let mut fds = [PollFd::new(file.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, timeout) {
            Ok(0) => break None,
            Ok(_) => {
                let mut buf = [0u8; 256];
                match file.read(&mut buf) {
                    Ok(0) => break None,
                    Ok(n) => {
                        if let Some(answer) = decoder.feed(&buf[..n]) {
                            break Some(answer);
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "burst fifo read failed");
                        break None;
                    }
                }
            }
            Err(nix::errno::Errno::EINTR) => {}
            Err(e) => {
                tracing::warn!(error = %e, "poll on burst fifo failed");
                break None;
            }
        }
    };

    // The marker is ours to clear no matter how the wait ended. A host
    // that vanished mid-wait means exit regardless.
    match fsa.verify() {
        Ok(true) => {
            if let Ok(host) = fsa.host_mut() {
                host.job_status[slot].set_burst_marker(SlotMarker::None);
            }
        }
        _ => return BurstWait::Exit,
    }

    match answer {
        Some(BurstAnswer::Job(msg_name)) => BurstWait::NewJob(msg_name),
        Some(BurstAnswer::Incompatible) | None => BurstWait::Exit,
    }
}

fn libc_o_nonblock() -> i32 {
    nix::fcntl::OFlag::O_NONBLOCK.bits()
}
