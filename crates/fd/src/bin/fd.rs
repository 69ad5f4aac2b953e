// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fd` - the file distributor supervisor daemon.

use afd_core::workdir::AFD_WORK_DIR_ENV;
use afd_core::WorkDir;
use afd_fd::Supervisor;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fd", about = "AFD file distributor supervisor")]
struct Args {
    /// Working directory (falls back to AFD_WORK_DIR)
    #[arg(short = 'w', long = "work-dir")]
    work_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let workdir = WorkDir::resolve(args.work_dir, AFD_WORK_DIR_ENV)?;
    workdir.ensure_layout()?;

    let file_appender = tracing_appender::rolling::never(workdir.log_dir(), "fd.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let mut supervisor = Supervisor::start(workdir)?;
    supervisor.run().await?;
    Ok(())
}
