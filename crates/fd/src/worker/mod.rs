// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transfer-worker library, executed by the `sf_loc` and `gf_loc`
//! binaries.
//!
//! Workers are blocking, single-threaded processes: argv carries the
//! FSA position and job handle, one `attach_pos` call maps the status
//! area, and every failure path funnels into an enumerated exit code
//! the supervisor interprets.

pub mod burst_wait;
pub mod fetch;
pub mod init;
pub mod pacer;
pub mod scan;
pub mod send;
pub mod transport;

pub use burst_wait::{wait_for_burst, BurstWait};
pub use fetch::{run_fetch, FetchSummary};
pub use init::{finish, FetchArgs, SendArgs};
pub use pacer::Pacer;
pub use scan::{scan_job_dir, ScanOutcome, SpoolFile};
pub use send::{run_send, SendSummary};
pub use transport::{LocTransport, RemoteEntry, Transport, TransferError};

/// The "X bytes in Y files" exit line, with append/burst suffixes.
pub fn what_done_line(how: &str, bytes: u64, files: u32, appends: u32, bursts: u32) -> String {
    let mut line = format!(
        "{how} {bytes} bytes in {files} file{}",
        if files == 1 { "" } else { "s" }
    );
    match appends {
        0 => {}
        1 => line.push_str(" [APPEND]"),
        n => line.push_str(&format!(" [APPEND * {n}]")),
    }
    match bursts {
        0 => {}
        1 => line.push_str(" [BURST]"),
        n => line.push_str(&format!(" [BURST * {n}]")),
    }
    line
}
