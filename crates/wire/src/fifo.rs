// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opcode framing for the monitor and FD command fifos.

const OP_SHUTDOWN: u8 = 1;
const OP_IS_ALIVE: u8 = 2;
const OP_ACKN: u8 = 3;
const OP_DISABLE_MON: u8 = 4;
const OP_ENABLE_MON: u8 = 5;
const OP_RETRY_HOST: u8 = 6;
const OP_ENABLE_HOST: u8 = 7;
const OP_DISABLE_HOST: u8 = 8;

/// A command carried over a control fifo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FifoCommand {
    Shutdown,
    IsAlive,
    Ackn,
    /// Disable monitoring of the MSA row at this position.
    DisableMon(usize),
    /// Enable monitoring of the MSA row at this position.
    EnableMon(usize),
    /// Wake the retry logic for a host alias.
    RetryHost(String),
    EnableHost(String),
    DisableHost(String),
}

impl FifoCommand {
    /// Encode to the on-fifo byte form.
    pub fn encode(&self) -> Vec<u8> {
        fn with_arg(op: u8, arg: &str) -> Vec<u8> {
            let mut out = Vec::with_capacity(arg.len() + 3);
            out.push(op);
            out.push(b' ');
            out.extend_from_slice(arg.as_bytes());
            out.push(0);
            out
        }
        match self {
            FifoCommand::Shutdown => vec![OP_SHUTDOWN],
            FifoCommand::IsAlive => vec![OP_IS_ALIVE],
            FifoCommand::Ackn => vec![OP_ACKN],
            FifoCommand::DisableMon(pos) => with_arg(OP_DISABLE_MON, &pos.to_string()),
            FifoCommand::EnableMon(pos) => with_arg(OP_ENABLE_MON, &pos.to_string()),
            FifoCommand::RetryHost(alias) => with_arg(OP_RETRY_HOST, alias),
            FifoCommand::EnableHost(alias) => with_arg(OP_ENABLE_HOST, alias),
            FifoCommand::DisableHost(alias) => with_arg(OP_DISABLE_HOST, alias),
        }
    }
}

/// Stateful decoder; feed it whatever `read()` returned.
#[derive(Debug, Default)]
pub struct FifoDecoder {
    carry: Vec<u8>,
}

impl FifoDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as many complete commands as the buffered bytes allow.
    ///
    /// Garbage bytes are logged and skipped, per the fifo contract.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<FifoCommand> {
        self.carry.extend_from_slice(bytes);
        let mut out = Vec::new();
        let mut i = 0;

        while i < self.carry.len() {
            let op = self.carry[i];
            match op {
                OP_SHUTDOWN => {
                    out.push(FifoCommand::Shutdown);
                    i += 1;
                }
                OP_IS_ALIVE => {
                    out.push(FifoCommand::IsAlive);
                    i += 1;
                }
                OP_ACKN => {
                    out.push(FifoCommand::Ackn);
                    i += 1;
                }
                OP_DISABLE_MON | OP_ENABLE_MON | OP_RETRY_HOST | OP_ENABLE_HOST
                | OP_DISABLE_HOST => {
                    // Argument form: op SP bytes NUL. Wait for the NUL.
                    let Some(nul) = self.carry[i..].iter().position(|b| *b == 0) else {
                        break;
                    };
                    let frame = &self.carry[i..i + nul];
                    if frame.len() < 2 || frame[1] != b' ' {
                        tracing::warn!(byte = op, "garbage opcode framing on fifo, skipping");
                        i += 1;
                        continue;
                    }
                    let arg = String::from_utf8_lossy(&frame[2..]).into_owned();
                    match op {
                        OP_DISABLE_MON | OP_ENABLE_MON => match arg.parse::<usize>() {
                            Ok(pos) if op == OP_DISABLE_MON => {
                                out.push(FifoCommand::DisableMon(pos))
                            }
                            Ok(pos) => out.push(FifoCommand::EnableMon(pos)),
                            Err(_) => {
                                tracing::warn!(%arg, "non-numeric position on fifo, dropping")
                            }
                        },
                        OP_RETRY_HOST => out.push(FifoCommand::RetryHost(arg)),
                        OP_ENABLE_HOST => out.push(FifoCommand::EnableHost(arg)),
                        _ => out.push(FifoCommand::DisableHost(arg)),
                    }
                    i += nul + 1;
                }
                other => {
                    tracing::warn!(byte = other, "reading garbage on fifo, ignoring");
                    i += 1;
                }
            }
        }

        self.carry.drain(..i);
        out
    }

    /// Bytes still waiting for their terminator.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

#[cfg(test)]
#[path = "fifo_tests.rs"]
mod tests;
