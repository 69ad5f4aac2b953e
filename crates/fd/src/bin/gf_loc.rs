// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gf_loc` - fetch worker for local-filesystem sources.
//!
//! Invoked by the FD supervisor only:
//! `gf_loc <work_dir> <slot> <fsa_id> <fsa_pos> <dir_alias>`

use afd_core::{TransferExit, WorkDir};
use afd_fd::worker::{finish, init, run_fetch, FetchArgs};
use afd_statearea::{Fra, FsaSingle};
use clap::Parser;

fn main() {
    let args = FetchArgs::parse();
    init::init_worker_logging();
    let workdir = WorkDir::new(&args.work_dir);

    let mut fsa = match FsaSingle::attach_pos(&workdir.fsa_file(), args.fsa_pos) {
        Ok(fsa) => fsa,
        Err(e) => {
            tracing::error!(error = %e, "cannot attach FSA position");
            std::process::exit(finish(&workdir, TransferExit::IsFaulty));
        }
    };
    let mut fra = match Fra::attach(&workdir.fra_file()) {
        Ok(fra) => fra,
        Err(e) => {
            tracing::error!(error = %e, "cannot attach FRA");
            std::process::exit(finish(&workdir, TransferExit::IsFaulty));
        }
    };

    let code = match run_fetch(&workdir, &mut fsa, args.slot, &mut fra, &args.dir_alias) {
        Ok(summary) => {
            tracing::info!(
                files = summary.files_fetched,
                bytes = summary.bytes_fetched,
                skipped = summary.skipped,
                dir = %args.dir_alias,
                "retrieve pass complete"
            );
            TransferExit::Success
        }
        Err(e) => {
            tracing::error!(error = %e, dir = %args.dir_alias, "retrieve failed");
            e.exit()
        }
    };
    std::process::exit(finish(&workdir, code));
}
