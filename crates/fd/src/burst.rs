// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The burst rendezvous between the supervisor and a waiting worker.
//!
//! A worker that finished its job publishes a slot marker and blocks on
//! its per-slot fifo. The supervisor answers with either the next
//! message name (connection reuse) or an incompatible marker telling
//! the worker to disconnect so a fresh worker can take the job.

use std::time::Duration;

/// Floor for the burst wait; the timeout-minus-margin formula must
/// never reach zero.
pub const MIN_BURST_WAIT: Duration = Duration::from_secs(1);

const TAG_JOB: u8 = 1;
const TAG_INCOMPATIBLE: u8 = 2;

/// What the supervisor wrote into the slot fifo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurstAnswer {
    /// Take this message next on the open connection.
    Job(String),
    /// The queued job cannot reuse the connection; disconnect and exit.
    Incompatible,
}

impl BurstAnswer {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BurstAnswer::Job(msg_name) => {
                let mut out = Vec::with_capacity(msg_name.len() + 2);
                out.push(TAG_JOB);
                out.extend_from_slice(msg_name.as_bytes());
                out.push(0);
                out
            }
            BurstAnswer::Incompatible => vec![TAG_INCOMPATIBLE],
        }
    }
}

/// Carry-buffer decoder for the worker side of the slot fifo.
#[derive(Debug, Default)]
pub struct BurstDecoder {
    carry: Vec<u8>,
}

impl BurstDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Option<BurstAnswer> {
        self.carry.extend_from_slice(bytes);
        match self.carry.first() {
            Some(&TAG_INCOMPATIBLE) => {
                self.carry.drain(..1);
                Some(BurstAnswer::Incompatible)
            }
            Some(&TAG_JOB) => {
                let nul = self.carry[1..].iter().position(|b| *b == 0)?;
                let msg = String::from_utf8_lossy(&self.carry[1..1 + nul]).into_owned();
                self.carry.drain(..nul + 2);
                Some(BurstAnswer::Job(msg))
            }
            Some(other) => {
                tracing::warn!(byte = other, "garbage on burst fifo, dropping byte");
                self.carry.drain(..1);
                None
            }
            None => None,
        }
    }
}

/// How long a worker waits for a burst answer.
///
/// Keep-connected bounds the idle hold; the transfer timeout minus a
/// 5-second margin bounds the wait so the supervisor never mistakes a
/// waiting worker for a hung one. Floor of [`MIN_BURST_WAIT`].
pub fn burst_deadline(keep_connected: u32, transfer_timeout: i64) -> Duration {
    let margin = (transfer_timeout - 5).max(MIN_BURST_WAIT.as_secs() as i64) as u64;
    let wait = if keep_connected == 0 { margin } else { u64::from(keep_connected).min(margin) };
    Duration::from_secs(wait.max(MIN_BURST_WAIT.as_secs()))
}

#[cfg(test)]
#[path = "burst_tests.rs"]
mod tests;
