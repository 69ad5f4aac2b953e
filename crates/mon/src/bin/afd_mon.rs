// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `afd_mon` - monitors remote AFDs.
//!
//! Contacts each configured AFDD on its own interval via one `mon`
//! probe per row; AFD_MON_CONFIG is re-read whenever its mtime moves,
//! so a restart is never needed for a fleet change.

use afd_core::workdir::MON_WORK_DIR_ENV;
use afd_core::WorkDir;
use afd_mon::MonSupervisor;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "afd_mon", about = "AFD fleet monitor supervisor")]
struct Args {
    /// Working directory (falls back to MON_WORK_DIR)
    #[arg(short = 'w', long = "work-dir")]
    work_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let workdir = WorkDir::resolve(args.work_dir, MON_WORK_DIR_ENV)?;
    workdir.ensure_layout()?;

    let file_appender = tracing_appender::rolling::never(workdir.log_dir(), "mon_sys.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let mut supervisor = MonSupervisor::start(workdir)?;
    supervisor.run().await?;
    Ok(())
}
