// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing for the delete-jobs fifo.
//!
//! Messages are a one-byte type tag followed by a NUL-terminated target
//! string. The producer may be split across any number of `read()`s and
//! may also write garbage; unknown tag bytes are dropped one at a time
//! until the decoder resynchronizes on a valid tag.

const TAG_ALL_JOBS_FROM_HOST: u8 = 1;
const TAG_MESSAGE: u8 = 2;
const TAG_SINGLE_FILE: u8 = 3;

/// A delete request for the FD supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteCommand {
    /// Kill and purge every job queued or running for a host alias.
    AllJobsFromHost(String),
    /// Remove one queued job by message name.
    Message(String),
    /// Remove a single file; payload is `<msg_name>|<file_name>`.
    SingleFile(String),
}

impl DeleteCommand {
    pub fn encode(&self) -> Vec<u8> {
        let (tag, payload) = match self {
            DeleteCommand::AllJobsFromHost(s) => (TAG_ALL_JOBS_FROM_HOST, s),
            DeleteCommand::Message(s) => (TAG_MESSAGE, s),
            DeleteCommand::SingleFile(s) => (TAG_SINGLE_FILE, s),
        };
        let mut out = Vec::with_capacity(payload.len() + 2);
        out.push(tag);
        out.extend_from_slice(payload.as_bytes());
        out.push(0);
        out
    }
}

/// Stateful reader for the delete fifo.
///
/// Owns the carry buffer explicitly; there is exactly one of these per
/// supervisor, not a process-wide static.
#[derive(Debug, Default)]
pub struct DeleteDecoder {
    carry: Vec<u8>,
}

impl DeleteDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<DeleteCommand> {
        self.carry.extend_from_slice(bytes);
        let mut out = Vec::new();
        let mut i = 0;

        while i < self.carry.len() {
            let tag = self.carry[i];
            if !matches!(tag, TAG_ALL_JOBS_FROM_HOST | TAG_MESSAGE | TAG_SINGLE_FILE) {
                tracing::warn!(byte = tag, "garbage on delete fifo, dropping byte");
                i += 1;
                continue;
            }
            let Some(nul) = self.carry[i + 1..].iter().position(|b| *b == 0) else {
                break;
            };
            let payload =
                String::from_utf8_lossy(&self.carry[i + 1..i + 1 + nul]).into_owned();
            out.push(match tag {
                TAG_ALL_JOBS_FROM_HOST => DeleteCommand::AllJobsFromHost(payload),
                TAG_MESSAGE => DeleteCommand::Message(payload),
                _ => DeleteCommand::SingleFile(payload),
            });
            i += nul + 2;
        }

        self.carry.drain(..i);
        out
    }

    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
