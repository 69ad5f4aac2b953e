// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mafdcmd` - enables, disables, or retries monitored AFDs.
//!
//! Targets are aliases or MSA positions; opcodes go onto the monitor
//! command fifo (or the probe's retry fifo for `-r`).

use afd_cli::{control::send_command, lookup_permissions, Token};
use afd_core::workdir::MON_WORK_DIR_ENV;
use afd_core::WorkDir;
use afd_fd::fifos::retry_mon_fifo_path;
use afd_mon::supervisor::mon_cmd_fifo;
use afd_statearea::Msa;
use afd_wire::FifoCommand;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mafdcmd", about = "command tool for the AFD monitor")]
struct Args {
    /// Enable monitoring of the given AFDs
    #[arg(short = 'e', conflicts_with_all = ["disable", "toggle", "retry"])]
    enable: bool,

    /// Disable monitoring of the given AFDs
    #[arg(short = 'E')]
    disable: bool,

    /// Toggle enable/disable of the given AFDs
    #[arg(short = 'X')]
    toggle: bool,

    /// Wake the probe of the given AFDs to retry at once
    #[arg(short = 'r')]
    retry: bool,

    /// Working directory (falls back to MON_WORK_DIR)
    #[arg(short = 'w', long = "work-dir")]
    work_dir: Option<PathBuf>,

    /// AFD aliases or MSA positions
    #[arg(required = true)]
    targets: Vec<String>,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let args = Args::parse();
    if !(args.enable || args.disable || args.toggle || args.retry) {
        eprintln!("ERROR   : one of -e, -E, -X or -r is required.");
        return 1;
    }
    let workdir = match WorkDir::resolve(args.work_dir, MON_WORK_DIR_ENV) {
        Ok(wd) => wd,
        Err(e) => {
            eprintln!("ERROR   : {e}");
            return 1;
        }
    };

    let user = std::env::var("USER").unwrap_or_default();
    let perms = lookup_permissions(&workdir.permissions_file(), &user);
    if !perms.has(Token::MafdCmd) {
        eprintln!("ERROR   : user {user} may not use mafdcmd.");
        return 1;
    }
    if (args.enable || args.disable || args.toggle) && !perms.has(Token::DisableAfd) {
        eprintln!("ERROR   : user {user} may not enable/disable an AFD.");
        return 1;
    }
    if args.retry && !perms.has(Token::Retry) {
        eprintln!("ERROR   : user {user} may not retry an AFD.");
        return 1;
    }

    let msa = match Msa::attach(&workdir.msa_file()) {
        Ok(msa) => msa,
        Err(e) => {
            eprintln!("ERROR   : cannot attach MSA: {e}");
            return 1;
        }
    };

    let mut failures = 0;
    for target in &args.targets {
        let Some(pos) = resolve(&msa, target) else {
            eprintln!("ERROR   : {target} is not in the MSA.");
            failures += 1;
            continue;
        };

        if args.retry {
            if let Err(e) = wake_probe(&workdir, pos) {
                eprintln!("ERROR   : failed to wake probe for {target}: {e}");
                failures += 1;
            }
            continue;
        }

        let disabled = msa
            .row(pos)
            .map(|r| r.connect_status() == afd_core::ConnectStatus::Disabled)
            .unwrap_or(false);
        let cmd = if args.enable || (args.toggle && disabled) {
            FifoCommand::EnableMon(pos)
        } else {
            FifoCommand::DisableMon(pos)
        };
        if let Err(e) = send_command(&mon_cmd_fifo(&workdir), &cmd) {
            eprintln!("ERROR   : failed to send command for {target}: {e}");
            failures += 1;
        }
    }

    if failures == 0 {
        0
    } else {
        1
    }
}

/// A target is a position when fully numeric, an alias otherwise.
fn resolve(msa: &Msa, target: &str) -> Option<usize> {
    if target.bytes().all(|b| b.is_ascii_digit()) {
        let pos: usize = target.parse().ok()?;
        return (pos < msa.count()).then_some(pos);
    }
    msa.position_of(target)
}

/// Any byte on the retry fifo wakes the probe out of its backoff.
fn wake_probe(workdir: &WorkDir, pos: usize) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let path = retry_mon_fifo_path(workdir, pos);
    afd_fd::fifos::ensure_fifo(&path)?;
    let mut fifo = std::fs::OpenOptions::new()
        .write(true)
        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
        .open(&path)?;
    fifo.write_all(b"r")
}
