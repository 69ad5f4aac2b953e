// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process plumbing: argv surface, logging setup, and the
//! finish notification every worker owes the supervisor.

use crate::fifos::FdFifos;
use afd_core::{TransferExit, WorkDir};
use afd_wire::encode_i32_frame;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

/// Argv of a send worker: `sf_loc <work_dir> <slot> <fsa_id> <fsa_pos>
/// <msg_name>`.
#[derive(Debug, Parser)]
pub struct SendArgs {
    pub work_dir: PathBuf,
    pub slot: usize,
    pub fsa_id: u32,
    pub fsa_pos: usize,
    pub msg_name: String,
}

/// Argv of a fetch worker: `gf_loc <work_dir> <slot> <fsa_id> <fsa_pos>
/// <dir_alias>`.
#[derive(Debug, Parser)]
pub struct FetchArgs {
    pub work_dir: PathBuf,
    pub slot: usize,
    pub fsa_id: u32,
    pub fsa_pos: usize,
    pub dir_alias: String,
}

/// Install the worker's tracing subscriber (stderr, env-filtered).
pub fn init_worker_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Last duty before exit: push our pid onto SF_FIN so the supervisor
/// reaps promptly, then return the process exit code.
pub fn finish(workdir: &WorkDir, exit: TransferExit) -> i32 {
    let fifos = FdFifos::new(workdir);
    let pid = std::process::id() as i32;
    let open = {
        use std::os::unix::fs::OpenOptionsExt;
        std::fs::OpenOptions::new()
            .write(true)
            .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
            .open(&fifos.sf_fin_fifo)
    };
    match open {
        Ok(mut fifo) => {
            if let Err(e) = fifo.write_all(&encode_i32_frame(pid)) {
                tracing::warn!(error = %e, "could not write finish frame");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "finish fifo not open, supervisor will sweep");
        }
    }
    exit.code()
}
