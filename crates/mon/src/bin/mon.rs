// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mon` - probe for one remote AFD.
//!
//! Invoked by `afd_mon` only: `mon [-w <workdir>] <position>`.

use afd_core::workdir::MON_WORK_DIR_ENV;
use afd_core::WorkDir;
use afd_mon::run_probe;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mon", about = "AFD monitor probe")]
struct Args {
    /// Working directory (falls back to MON_WORK_DIR)
    #[arg(short = 'w', long = "work-dir")]
    work_dir: Option<PathBuf>,
    /// MSA row this probe owns
    position: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let workdir = WorkDir::resolve(args.work_dir, MON_WORK_DIR_ENV)?;

    let file_appender = tracing_appender::rolling::never(workdir.log_dir(), "mon.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    run_probe(&workdir, args.position)
}
