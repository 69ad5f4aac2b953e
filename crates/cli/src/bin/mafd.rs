// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mafd` - controls startup and shutdown of `afd_mon`.
//!
//! Exit codes: 0 success, 1 usage or permission error, 5 "already
//! active" for `-c`.

use afd_cli::{check_alive, lookup_permissions, send_shutdown, start_afd_mon, Token, ALIVE_TIMEOUT};
use afd_core::workdir::MON_WORK_DIR_ENV;
use afd_core::WorkDir;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mafd", about = "controls the AFD monitor")]
struct Args {
    /// Only start afd_mon
    #[arg(short = 'a', conflicts_with_all = ["check", "check_start", "dialog", "shutdown", "silent_shutdown"])]
    start_only: bool,

    /// Only check if afd_mon is active
    #[arg(short = 'c')]
    check: bool,

    /// Check if afd_mon is active, if not start it
    #[arg(short = 'C')]
    check_start: bool,

    /// Only start the mon_ctrl dialog
    #[arg(short = 'd')]
    dialog: bool,

    /// Shutdown afd_mon
    #[arg(short = 's')]
    shutdown: bool,

    /// Silent afd_mon shutdown
    #[arg(short = 'S')]
    silent_shutdown: bool,

    /// Working directory (falls back to MON_WORK_DIR)
    #[arg(short = 'w', long = "work-dir")]
    work_dir: Option<PathBuf>,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let args = Args::parse();
    let workdir = match WorkDir::resolve(args.work_dir, MON_WORK_DIR_ENV) {
        Ok(wd) => wd,
        Err(e) => {
            eprintln!("ERROR   : {e}");
            return 1;
        }
    };

    let user = std::env::var("USER").unwrap_or_default();
    let perms = lookup_permissions(&workdir.permissions_file(), &user);

    if args.dialog {
        eprintln!("ERROR   : mon_ctrl is not part of this installation.");
        return 1;
    }

    if args.check {
        return if check_alive(&workdir, ALIVE_TIMEOUT) {
            println!("AFD_MON is active in {}", workdir.root().display());
            5
        } else {
            println!("No AFD_MON active in {}", workdir.root().display());
            0
        };
    }

    if args.shutdown || args.silent_shutdown {
        if !perms.has(Token::MonShutdown) {
            eprintln!("ERROR   : user {user} may not shutdown AFD_MON.");
            return 1;
        }
        if !check_alive(&workdir, ALIVE_TIMEOUT) {
            if !args.silent_shutdown {
                println!("No AFD_MON active in {}", workdir.root().display());
            }
            return 0;
        }
        if !args.silent_shutdown {
            println!("Starting AFD_MON shutdown ...");
        }
        return if send_shutdown(&workdir, ALIVE_TIMEOUT) {
            if !args.silent_shutdown {
                println!("Done!");
            }
            0
        } else {
            eprintln!("ERROR   : failed to shutdown AFD_MON.");
            1
        };
    }

    // Default, -a, and -C all may start the supervisor.
    if !perms.has(Token::MonStartup) {
        eprintln!("ERROR   : user {user} may not start AFD_MON.");
        return 1;
    }
    if check_alive(&workdir, ALIVE_TIMEOUT) {
        if args.check_start {
            println!("AFD_MON is active in {}", workdir.root().display());
            return 0;
        }
        println!("AFD_MON is already active in {}", workdir.root().display());
        return 0;
    }
    if let Err(e) = workdir.ensure_layout() {
        eprintln!("ERROR   : {e}");
        return 1;
    }
    match start_afd_mon(&workdir) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("ERROR   : could not start afd_mon: {e}");
            1
        }
    }
}
