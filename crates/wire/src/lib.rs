// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! afd-wire: byte framing for the command fifos and the AFDD protocol.
//!
//! Fifo messages are single opcode bytes, some followed by an ASCII
//! argument up to a NUL. Nothing here assumes a `read()` returns whole
//! frames: every decoder owns a carry buffer and resumes mid-message.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod afdd;
mod delete;
mod fifo;
mod frames;

pub use afdd::{
    parse_frame, AfddFrame, ClientCmd, LineReader, AFDD_SHUTDOWN_MESSAGE, GREETING_CODE,
};
pub use delete::{DeleteCommand, DeleteDecoder};
pub use fifo::{FifoCommand, FifoDecoder};
pub use frames::{encode_i32_frame, I32FrameDecoder};
