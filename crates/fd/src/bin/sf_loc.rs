// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf_loc` - send worker for local-filesystem destinations.
//!
//! Invoked by the FD supervisor only:
//! `sf_loc <work_dir> <slot> <fsa_id> <fsa_pos> <msg_name>`

use afd_core::{TransferExit, WorkDir};
use afd_fd::worker::{finish, init, run_send, SendArgs};
use afd_statearea::FsaSingle;
use clap::Parser;

fn main() {
    let args = SendArgs::parse();
    init::init_worker_logging();
    let workdir = WorkDir::new(&args.work_dir);

    let mut fsa = match FsaSingle::attach_pos(&workdir.fsa_file(), args.fsa_pos) {
        Ok(fsa) => fsa,
        Err(e) => {
            tracing::error!(error = %e, "cannot attach FSA position");
            std::process::exit(finish(&workdir, TransferExit::IsFaulty));
        }
    };

    let code = match run_send(&workdir, &mut fsa, args.slot, &args.msg_name) {
        Ok(summary) => {
            tracing::info!("{}", summary.log_line());
            TransferExit::Success
        }
        Err(e) => {
            tracing::error!(error = %e, msg_name = %args.msg_name, "transfer failed");
            e.exit()
        }
    };
    std::process::exit(finish(&workdir, code));
}
