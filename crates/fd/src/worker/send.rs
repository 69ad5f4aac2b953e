// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The send loop: one job end-to-end, plus bursts through the same
//! connection.

use super::burst_wait::{wait_for_burst, BurstWait};
use super::pacer::Pacer;
use super::scan::scan_job_dir;
use super::transport::{LocTransport, TransferError, Transport};
use super::what_done_line;
use crate::fifos::{write_wake_byte, FdFifos};
use crate::queue::Queue;
use afd_core::{
    host_status, rename::apply_rules, Clock, JobMessage, LockStyle, Scheme, SystemClock, WorkDir,
};
use afd_statearea::{FsaSingle, LockDomain};
use std::io::{Read, Write};

/// Totals reported by the atexit log line.
#[derive(Debug, Default)]
pub struct SendSummary {
    pub files_sent: u32,
    pub bytes_sent: u64,
    /// Jobs taken over the same connection beyond the first.
    pub bursts: u32,
    pub appends: u32,
    /// The host left the FSA mid-run; the worker quiesced.
    pub host_gone: bool,
}

impl SendSummary {
    pub fn log_line(&self) -> String {
        what_done_line("moved", self.bytes_sent, self.files_sent, self.appends, self.bursts)
    }
}

/// Run one send worker: the initial message plus any bursts.
pub fn run_send(
    workdir: &WorkDir,
    fsa: &mut FsaSingle,
    slot: usize,
    initial_msg_name: &str,
) -> Result<SendSummary, TransferError> {
    let clock = SystemClock;
    let mut summary = SendSummary::default();
    let mut msg_name = initial_msg_name.to_string();
    let mut msg = load_message(workdir, &msg_name)?;

    if msg.destination.scheme != Scheme::Loc {
        return Err(TransferError::Connect(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("scheme {:?} not built in", msg.destination.scheme),
        )));
    }

    let mut transport = LocTransport::new(&msg.destination.directory);
    transport.connect()?;
    let create_dir = host_flag(fsa, host_status::CREATE_TARGET_DIR)?;
    transport.enter_dir(create_dir)?;

    loop {
        send_one_job(workdir, fsa, slot, &msg, &msg_name, &mut transport, &mut summary, &clock)?;
        if summary.host_gone {
            break;
        }

        let keep_connected = fsa.host().map(|h| h.keep_connected).unwrap_or(0);
        let jobs_waiting = fsa
            .host()
            .map(|h| h.jobs_queued > 0 && h.active_transfers >= h.allowed_transfers)
            .unwrap_or(false);
        if keep_connected == 0 && !jobs_waiting {
            break;
        }

        match wait_for_burst(workdir, fsa, slot, jobs_waiting) {
            BurstWait::NewJob(next) => {
                let next_msg = load_message(workdir, &next)?;
                if !msg.destination.burst_compatible(&next_msg.destination) {
                    // The supervisor should never hand over an
                    // incompatible job; refuse it so it gets requeued.
                    tracing::warn!(msg_name = %next, "incompatible burst handover, exiting");
                    return Err(TransferError::StateArea("incompatible burst".into()));
                }
                summary.bursts += 1;
                msg = next_msg;
                msg_name = next;
                // Same destination directory per compatibility rules,
                // so the open "connection" carries over as-is.
            }
            BurstWait::Exit => break,
        }
    }

    transport.quit()?;
    Ok(summary)
}

fn load_message(workdir: &WorkDir, msg_name: &str) -> Result<JobMessage, TransferError> {
    let job_id = Queue::job_id_of(msg_name)
        .map_err(|e| TransferError::StateArea(e.to_string()))?;
    JobMessage::load(&workdir.msg_dir(), job_id)
        .map_err(|e| TransferError::StateArea(e.to_string()))
}

fn host_flag(fsa: &FsaSingle, flag: u32) -> Result<bool, TransferError> {
    Ok(fsa
        .host()
        .map_err(|e| TransferError::StateArea(e.to_string()))?
        .host_status
        & flag
        != 0)
}

/// Transfer every surviving file of one message.
#[allow(clippy::too_many_arguments)]
fn send_one_job(
    workdir: &WorkDir,
    fsa: &mut FsaSingle,
    slot: usize,
    msg: &JobMessage,
    msg_name: &str,
    transport: &mut dyn Transport,
    summary: &mut SendSummary,
    clock: &SystemClock,
) -> Result<(), TransferError> {
    let now = clock.epoch_secs();
    let sort = host_flag(fsa, host_status::SORT_FILE_NAMES)?;
    let scanned = scan_job_dir(workdir, msg, msg_name, sort, now)?;

    let sa_err = |e: afd_statearea::FsaError| TransferError::StateArea(e.to_string());

    if !verify(fsa, summary)? {
        return Ok(());
    }
    fsa.with_lock(LockDomain::Tfc, |host| {
        host.total_file_counter = host.total_file_counter.saturating_sub(scanned.not_send_files);
        host.total_file_size = host.total_file_size.saturating_sub(scanned.not_send_bytes);
    })
    .map_err(sa_err)?;

    {
        let host = fsa.host_mut().map_err(sa_err)?;
        let s = &mut host.job_status[slot];
        s.job_id = msg.job_id;
        s.no_of_files = scanned.files.len() as u32;
        s.file_size = scanned.files.iter().map(|f| f.size).sum();
        s.set_msg_name(msg_name);
    }

    let trl = fsa.host().map_err(sa_err)?.trl_per_process;
    let mut pacer = Pacer::new(trl);

    for file in &scanned.files {
        let final_name = apply_rules(&msg.rename_rules, &file.name);
        let sent = send_one_file(fsa, slot, msg, transport, file, &final_name, &mut pacer)?;
        summary.files_sent += 1;
        summary.bytes_sent += sent.bytes;
        if sent.appended {
            summary.appends += 1;
        }

        if !verify(fsa, summary)? {
            return Ok(());
        }
        fsa.with_lock(LockDomain::Tfc, |host| {
            host.total_file_counter = host.total_file_counter.saturating_sub(1);
            host.total_file_size = host.total_file_size.saturating_sub(file.size);
            host.file_counter_done += 1;
            host.bytes_send += sent.bytes;
        })
        .map_err(sa_err)?;

        // A successful file clears the host's error state.
        if fsa.host().map_err(sa_err)?.error_counter > 0 {
            fsa.with_lock(LockDomain::Ec, |host| {
                host.error_counter = 0;
            })
            .map_err(sa_err)?;
        }
        if fsa.host().map_err(sa_err)?.host_status & host_status::AUTO_PAUSE_QUEUE != 0 {
            fsa.with_lock(LockDomain::Hs, |host| {
                host.host_status &= !host_status::AUTO_PAUSE_QUEUE;
            })
            .map_err(sa_err)?;
            tracing::info!(host = fsa.pos(), "EA_START_QUEUE: auto-pause cleared");
        }
        let _ = write_wake_byte(&FdFifos::new(workdir).wake_up_fifo);

        // Archive or drop the spool copy.
        if msg.archive_time > 0 {
            let archive = workdir.archive_dir().join(msg.job_id.to_string());
            let target = archive.join(&file.name);
            std::fs::create_dir_all(&archive)
                .and_then(|()| std::fs::rename(&file.path, &target))
                .map_err(TransferError::Move)?;
        } else {
            std::fs::remove_file(&file.path).map_err(TransferError::Move)?;
        }
    }

    // The spool directory is consumed once every file is handled.
    let spool = workdir.outgoing_dir().join(msg_name);
    if let Err(e) = std::fs::remove_dir_all(&spool) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(dir = %spool.display(), error = %e, "spool dir not removed");
        }
    }

    tracing::info!("{}", summary.log_line());
    Ok(())
}

struct SentFile {
    bytes: u64,
    appended: bool,
}

fn send_one_file(
    fsa: &mut FsaSingle,
    slot: usize,
    msg: &JobMessage,
    transport: &mut dyn Transport,
    file: &super::scan::SpoolFile,
    final_name: &str,
    pacer: &mut Pacer,
) -> Result<SentFile, TransferError> {
    let sa_err = |e: afd_statearea::FsaError| TransferError::StateArea(e.to_string());
    let in_flight = msg.in_flight_name(final_name);

    // Lockfile style guards the whole write with a peer file.
    let lock_name = match &msg.lock {
        LockStyle::Lockfile => {
            let name = format!("{final_name}.lock");
            drop(transport.open_remote(&name, 0)?);
            Some(name)
        }
        _ => None,
    };

    let offset = if msg.file_size_offset != -1 {
        transport.remote_size(&in_flight)?.unwrap_or(0).min(file.size)
    } else {
        0
    };

    {
        let host = fsa.host_mut().map_err(sa_err)?;
        let s = &mut host.job_status[slot];
        s.set_file_name_in_use(&file.name);
        s.file_size_in_use = file.size;
        s.file_size_in_use_done = offset;
    }

    let mut local = std::fs::File::open(&file.path).map_err(|source| {
        TransferError::OpenLocal { name: file.path.display().to_string(), source }
    })?;
    if offset > 0 {
        use std::io::Seek;
        local
            .seek(std::io::SeekFrom::Start(offset))
            .map_err(TransferError::ReadLocal)?;
    }

    let mut remote = transport.open_remote(&in_flight, offset)?;
    let mut buf = vec![0u8; msg.block_size.max(512)];
    let mut sent = 0u64;
    loop {
        let n = local.read(&mut buf).map_err(TransferError::ReadLocal)?;
        if n == 0 {
            break;
        }
        remote.write_all(&buf[..n]).map_err(TransferError::WriteRemote)?;
        sent += n as u64;
        pacer.throttle(n);

        let host = fsa.host_mut().map_err(sa_err)?;
        let s = &mut host.job_status[slot];
        s.file_size_in_use_done = offset + sent;
        s.bytes_send += n as u64;
    }
    remote.flush().map_err(TransferError::CloseRemote)?;
    drop(remote);

    if in_flight != final_name {
        transport.finalize(&in_flight, final_name)?;
    }
    if let Some(mode) = msg.chmod {
        transport.set_mode(final_name, mode)?;
    }
    if let Some(lock_name) = lock_name {
        transport
            .remove_remote(&lock_name)
            .map_err(|e| TransferError::RemoveLockfile(std::io::Error::other(e.to_string())))?;
    }

    {
        let host = fsa.host_mut().map_err(sa_err)?;
        let s = &mut host.job_status[slot];
        s.no_of_files_done += 1;
        s.file_size_done += file.size;
        s.set_file_name_in_use("");
        s.file_size_in_use = 0;
        s.file_size_in_use_done = 0;
    }

    Ok(SentFile { bytes: sent, appended: offset > 0 })
}

/// Re-validate the mapping; flags the summary when the host vanished.
fn verify(fsa: &mut FsaSingle, summary: &mut SendSummary) -> Result<bool, TransferError> {
    match fsa.verify() {
        Ok(true) => Ok(true),
        Ok(false) => {
            tracing::warn!("host left the FSA, quiescing");
            summary.host_gone = true;
            Ok(false)
        }
        Err(e) => Err(TransferError::StateArea(e.to_string())),
    }
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
