// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fetch loop: list a remote directory, drive the retrieve list,
//! and pull new files into the incoming spool.

use super::pacer::Pacer;
use super::transport::{LocTransport, TransferError, Transport};
use afd_core::{host_status, Clock, Destination, Scheme, SystemClock, TriSign, WorkDir};
use afd_statearea::{
    records::DirRecord, FetchDecision, Fra, FsaSingle, ListOptions, LockDomain, RetrieveList,
    StupidMode,
};
use std::io::{Read, Write};

/// Totals reported when the worker exits.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub files_fetched: u32,
    pub bytes_fetched: u64,
    pub skipped: u32,
}

fn tri(sign_byte: u8, reference: i64) -> Option<(TriSign, i64)> {
    if reference == 0 {
        return None;
    }
    let sign = match sign_byte {
        1 => TriSign::LessThan,
        2 => TriSign::GreaterThan,
        _ => TriSign::Equal,
    };
    Some((sign, reference))
}

fn list_options(dir: &DirRecord) -> ListOptions {
    ListOptions {
        stupid_mode: match dir.stupid_mode {
            1 => StupidMode::Yes,
            2 => StupidMode::GetOnceOnly,
            _ => StupidMode::No,
        },
        ignore_size: tri(dir.gt_lt_sign_size, dir.ignore_size),
        ignore_file_time: tri(dir.gt_lt_sign_time, dir.ignore_file_time),
    }
}

/// Run one fetch worker for `dir_alias`.
pub fn run_fetch(
    workdir: &WorkDir,
    fsa: &mut FsaSingle,
    slot: usize,
    fra: &mut Fra,
    dir_alias: &str,
) -> Result<FetchSummary, TransferError> {
    let clock = SystemClock;
    let sa_err = |e: String| TransferError::StateArea(e);

    let fra_pos = fra
        .position_of(dir_alias)
        .ok_or_else(|| sa_err(format!("dir {dir_alias} not in FRA")))?;
    let (url, opts, remove_after) = {
        let dir = fra.dir(fra_pos).map_err(|e| sa_err(e.to_string()))?;
        (dir.url().to_string(), list_options(dir), dir.remove == 1)
    };
    let keep_time_stamp = fsa
        .host()
        .map(|h| h.host_status & host_status::KEEP_TIME_STAMP != 0)
        .unwrap_or(false);

    let dest = Destination::parse(&url).map_err(|e| sa_err(e.to_string()))?;
    if dest.scheme != Scheme::Loc {
        return Err(TransferError::Connect(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("scheme {:?} not built in", dest.scheme),
        )));
    }

    let transient = !matches!(opts.stupid_mode, StupidMode::No) || remove_after;
    let mut rl = RetrieveList::attach(&workdir.ls_data_dir(), dir_alias, transient)
        .map_err(|e| sa_err(e.to_string()))?;

    let mut transport = LocTransport::new(&dest.directory);
    transport.connect()?;
    transport.enter_dir(false)?;

    let landing = workdir.incoming_dir().join(dir_alias);
    std::fs::create_dir_all(&landing).map_err(|source| TransferError::OpenLocal {
        name: landing.display().to_string(),
        source,
    })?;

    let now = clock.epoch_secs();
    let mut summary = FetchSummary::default();
    rl.mark_not_in_list_all();

    let trl = fsa.host().map(|h| h.trl_per_process).unwrap_or(0);
    let mut pacer = Pacer::new(trl);

    for entry in transport.list()? {
        let decision = rl
            .check_list(&entry.name, entry.size, entry.mtime, &opts, now)
            .map_err(|e| sa_err(e.to_string()))?;
        if decision == FetchDecision::Skip {
            summary.skipped += 1;
            continue;
        }

        match fetch_one(
            &mut transport,
            &landing,
            &entry.name,
            entry.mtime,
            keep_time_stamp,
            &mut pacer,
        ) {
            Ok(bytes) => {
                if bytes as i64 != entry.size {
                    tracing::warn!(file = %entry.name, listed = entry.size, got = bytes,
                        "size changed between listing and download, accepting new size");
                }
                rl.mark_retrieved(&entry.name);
                summary.files_fetched += 1;
                summary.bytes_fetched += bytes;

                if remove_after {
                    if let Err(e) = transport.remove_remote(&entry.name) {
                        tracing::warn!(file = %entry.name, error = %e,
                            "failed to delete remote file after fetch");
                    }
                }

                if fsa.verify().map_err(|e| sa_err(e.to_string()))? {
                    fsa.with_lock(LockDomain::Tfc, |host| {
                        host.file_counter_done += 1;
                        host.bytes_send += bytes;
                    })
                    .map_err(|e| sa_err(e.to_string()))?;
                }
                {
                    let dir = fra.dir_mut(fra_pos).map_err(|e| sa_err(e.to_string()))?;
                    dir.files_received += 1;
                    dir.bytes_received += bytes;
                }
                if let Ok(host) = fsa.host_mut() {
                    let s = &mut host.job_status[slot];
                    s.no_of_files_done += 1;
                    s.bytes_send += bytes;
                }
            }
            Err(TransferError::OpenRemote { ref name, ref source })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                // Listed but gone by the time we fetched: swallow, the
                // next listing pass forgets it.
                tracing::warn!(file = %name, "remote file vanished before fetch");
                rl.mark_retrieved(&entry.name);
            }
            Err(e) => return Err(e),
        }
    }

    rl.compact().map_err(|e| sa_err(e.to_string()))?;
    rl.detach().map_err(|e| sa_err(e.to_string()))?;
    transport.quit()?;
    Ok(summary)
}

/// Pull one file to a dotfile, rename into place, restore mtime.
fn fetch_one(
    transport: &mut dyn Transport,
    landing: &std::path::Path,
    name: &str,
    mtime: i64,
    keep_time_stamp: bool,
    pacer: &mut Pacer,
) -> Result<u64, TransferError> {
    let mut remote = transport.open_read(name)?;
    let dot_path = landing.join(format!(".{name}"));
    let final_path = landing.join(name);

    let mut local = std::fs::File::create(&dot_path).map_err(|source| {
        TransferError::OpenLocal { name: dot_path.display().to_string(), source }
    })?;
    let mut buf = [0u8; 4096];
    let mut total = 0u64;
    loop {
        let n = remote.read(&mut buf).map_err(TransferError::WriteRemote)?;
        if n == 0 {
            break;
        }
        local.write_all(&buf[..n]).map_err(TransferError::WriteLocal)?;
        total += n as u64;
        pacer.throttle(n);
    }
    local.flush().map_err(TransferError::WriteLocal)?;
    drop(local);

    if keep_time_stamp && mtime > 0 {
        let tv = nix::sys::time::TimeVal::new(mtime, 0);
        if let Err(e) = nix::sys::stat::utimes(&dot_path, &tv, &tv) {
            tracing::warn!(file = %name, error = %e, "failed to restore mtime");
        }
    }

    std::fs::rename(&dot_path, &final_path).map_err(TransferError::Rename)?;
    Ok(total)
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
