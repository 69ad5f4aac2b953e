// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `mon` probe: one TCP client per monitored AFD.
//!
//! Connects, subscribes to the status stream, and translates every
//! frame into its MSA row. On any protocol error the session is torn
//! down and retried after RETRY_INTERVAL seconds, or sooner when the
//! retry fifo is poked.

use afd_core::limits::RETRY_INTERVAL;
use afd_core::{ConnectStatus, WorkDir};
use afd_fd::fifos::{ensure_fifo, retry_mon_fifo_path};
use afd_statearea::{AhlFile, Msa};
use afd_wire::{parse_frame, AfddFrame, ClientCmd, LineReader};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::time::Duration;

/// Control-flow outcome of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEvent {
    None,
    /// The remote announced shutdown; disconnect and retry later.
    Shutdown,
}

/// Fold one parsed frame into the probe's MSA row.
pub fn apply_frame(msa: &mut Msa, pos: usize, ahl: &mut AhlFile, frame: &AfddFrame) -> ProbeEvent {
    let Ok(row) = msa.row_mut(pos) else { return ProbeEvent::None };
    match frame {
        AfddFrame::IntervalSummary {
            fc,
            fs,
            tr,
            fr,
            ec,
            host_error_counter,
            no_of_transfers,
            jobs_in_queue,
        } => {
            row.fc = *fc;
            row.fs = *fs;
            row.tr = *tr;
            row.fr = *fr;
            row.ec = *ec;
            row.host_error_counter = *host_error_counter;
            row.no_of_transfers = *no_of_transfers;
            row.jobs_in_queue = *jobs_in_queue;
            if row.tr > row.top_tr[0] {
                row.top_tr[0] = row.tr;
            }
            if row.fr > row.top_fr[0] {
                row.top_fr[0] = row.fr;
            }
            if row.no_of_transfers > row.top_no_of_transfers[0] {
                row.top_no_of_transfers[0] = row.no_of_transfers;
            }
        }
        AfddFrame::AmgStatus(v) => row.amg = *v,
        AfddFrame::FdStatus(v) => row.fd = *v,
        AfddFrame::ArchiveWatchStatus(v) => row.archive_watch = *v,
        AfddFrame::NoOfHosts(n) => {
            if row.no_of_hosts as usize != *n {
                row.no_of_hosts = *n as i32;
                if let Err(e) = ahl.resize(*n) {
                    tracing::warn!(error = %e, "failed to resize host list file");
                }
            }
        }
        AfddFrame::MaxConnections(n) => row.max_connections = *n,
        AfddFrame::SysLogRadar { counter, fifo } => {
            row.sys_log_ec = *counter;
            row.sys_log_fifo = *fifo;
        }
        AfddFrame::HostList { pos: hl_pos, alias, real1, real2 } => {
            if *hl_pos < row.no_of_hosts as usize {
                if let Ok(entry) = ahl.row_mut(*hl_pos) {
                    entry.set(alias, real1, real2);
                }
            } else {
                tracing::warn!(pos = hl_pos, hosts = row.no_of_hosts,
                    "host list row out of range, dropping");
            }
        }
        AfddFrame::Version(v) => row.set_afd_version(v),
        AfddFrame::WorkDir(dir) => row.set_r_work_dir(dir),
        AfddFrame::ReplyCode(_) | AfddFrame::Unknown(_) => {}
        AfddFrame::Shutdown => return ProbeEvent::Shutdown,
    }
    ProbeEvent::None
}

/// Next UTC-midnight boundary after `now`.
fn next_day_boundary(now: i64) -> i64 {
    (now / 86_400) * 86_400 + 86_400
}

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Run the probe for MSA row `pos` until killed.
pub fn run_probe(workdir: &WorkDir, pos: usize) -> Result<(), anyhow::Error> {
    let mut pos = pos;
    let mut msa = Msa::attach(&workdir.msa_file())?;
    let (alias, hostname, port, poll_interval) = {
        let row = msa.row(pos)?;
        (
            row.afd_alias().to_string(),
            row.hostname().to_string(),
            row.port.max(0) as u16,
            row.poll_interval.max(1) as u64,
        )
    };
    let mut ahl = AhlFile::open(
        &workdir.ahl_file(pos),
        msa.row(pos)?.no_of_hosts.max(0) as usize,
    )?;

    let retry_fifo = retry_mon_fifo_path(workdir, pos);
    ensure_fifo(&retry_fifo)?;
    let retry = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
        .open(&retry_fifo)?;

    let mut new_day_time = next_day_boundary(now_epoch());

    loop {
        // A rebuilt MSA (config reload) invalidates this mapping; find
        // our row again or quiesce if it is gone.
        if msa.is_stale() {
            let fresh = Msa::attach(&workdir.msa_file())?;
            match fresh.position_of(&alias) {
                Some(new_pos) => {
                    if new_pos != pos {
                        ahl = AhlFile::open(
                            &workdir.ahl_file(new_pos),
                            fresh.row(new_pos)?.no_of_hosts.max(0) as usize,
                        )?;
                        pos = new_pos;
                    }
                    msa = fresh;
                }
                None => {
                    tracing::info!(%alias, "row left the MSA, stopping probe");
                    return Ok(());
                }
            }
        }

        msa.row_mut(pos)?.set_connect_status(ConnectStatus::Connecting);
        match probe_session(
            &mut msa,
            pos,
            &mut ahl,
            &alias,
            &hostname,
            port,
            poll_interval,
            &mut new_day_time,
        ) {
            Ok(()) => {
                tracing::info!(%alias, "AFDD session ended");
            }
            Err(e) => {
                tracing::error!(%alias, error = %e, "AFDD session failed");
            }
        }
        {
            let row = msa.row_mut(pos)?;
            row.tr = 0;
            row.set_connect_status(ConnectStatus::Disconnected);
        }

        // Sleep out the retry interval, or less if somebody pokes the
        // retry fifo.
        wait_for_retry(&retry, Duration::from_secs(RETRY_INTERVAL));
    }
}

#[allow(clippy::too_many_arguments)]
fn probe_session(
    msa: &mut Msa,
    pos: usize,
    ahl: &mut AhlFile,
    alias: &str,
    hostname: &str,
    port: u16,
    poll_interval: u64,
    new_day_time: &mut i64,
) -> Result<(), anyhow::Error> {
    let addr = (hostname, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("no address for {hostname}:{port}"))?;
    let mut stream = TcpStream::connect_timeout(&addr, Duration::from_secs(20))?;
    stream.set_read_timeout(Some(Duration::from_secs(poll_interval)))?;

    let mut reader = LineReader::new();
    let mut buf = [0u8; 4096];

    // Greeting, then subscribe.
    let n = stream.read(&mut buf)?;
    for line in reader.feed(&buf[..n]) {
        match parse_frame(&line) {
            AfddFrame::ReplyCode(code) if code == afd_wire::GREETING_CODE => {
                tracing::debug!(%alias, %line, "greeting");
            }
            _ => tracing::warn!(%alias, %line, "unexpected greeting line"),
        }
    }
    stream.write_all(ClientCmd::StartStat.as_line().as_bytes())?;
    msa.row_mut(pos)?.set_connect_status(ConnectStatus::Active);
    tracing::info!(%alias, "========> AFDD Connected <========");

    loop {
        let now = now_epoch();
        if now > *new_day_time {
            msa.row_mut(pos)?.roll_top_rates();
            *new_day_time = next_day_boundary(now);
        }

        match stream.read(&mut buf) {
            Ok(0) => return Err(anyhow::anyhow!("connection closed by remote")),
            Ok(n) => {
                msa.row_mut(pos)?.last_data_time = now_epoch();
                for line in reader.feed(&buf[..n]) {
                    let frame = parse_frame(&line);
                    if apply_frame(msa, pos, ahl, &frame) == ProbeEvent::Shutdown {
                        tracing::info!(%alias, "remote AFDD is shutting down");
                        let _ = stream.write_all(ClientCmd::Quit.as_line().as_bytes());
                        return Ok(());
                    }
                }
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Poll-interval elapsed without traffic: ask.
                stream.write_all(ClientCmd::Stat.as_line().as_bytes())?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Block up to `max` on the retry fifo; any byte ends the wait early.
fn wait_for_retry(retry: &std::fs::File, max: Duration) {
    let millis = max.as_millis().min(i32::MAX as u128) as i32;
    let timeout = PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX);
    let mut fds = [PollFd::new(retry.as_fd(), PollFlags::POLLIN)];
    match poll(&mut fds, timeout) {
        Ok(n) if n > 0 => {
            let mut sink = [0u8; 64];
            let mut f = retry;
            let _ = f.read(&mut sink);
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
