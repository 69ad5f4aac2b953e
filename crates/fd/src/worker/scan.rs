// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spool scan of a job's file set before transfer.
//!
//! Files past the age limit are deleted here, before any protocol step.
//! Duplicates are deleted, stored aside under `files/store/<job-id>/`,
//! or merely logged, depending on the job's duplicate-check action.

use super::transport::TransferError;
use afd_core::{age_limit_expired, DupAction, DupVerdict, JobMessage, WorkDir};
use std::path::PathBuf;

/// One file that survived the filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mtime: i64,
}

/// Result of a spool scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<SpoolFile>,
    /// Files removed before transfer, and their bytes.
    pub not_send_files: u32,
    pub not_send_bytes: u64,
    pub age_deleted: u32,
    pub dup_deleted: u32,
    pub dup_stored: u32,
}

/// Scan `files/outgoing/<msg_name>`, applying age-limit and
/// duplicate-check filters. `sort` orders survivors oldest-first.
pub fn scan_job_dir(
    workdir: &WorkDir,
    msg: &JobMessage,
    msg_name: &str,
    sort: bool,
    now: i64,
) -> Result<ScanOutcome, TransferError> {
    let dir = workdir.outgoing_dir().join(msg_name);
    let mut outcome = ScanOutcome::default();
    let read = std::fs::read_dir(&dir).map_err(|source| TransferError::OpenLocal {
        name: dir.display().to_string(),
        source,
    })?;

    let dup_ledger = workdir
        .store_dir()
        .join(".dupcheck")
        .join(format!("{}.json", msg.job_id));

    for entry in read {
        let entry = entry.map_err(TransferError::ReadLocal)?;
        let meta = entry.metadata().map_err(TransferError::ReadLocal)?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let size = meta.len();
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        if age_limit_expired(msg.age_limit, now, mtime) {
            tracing::info!(file = %name, age_limit = msg.age_limit, "AGE_OUTPUT: deleting");
            if let Err(e) = std::fs::remove_file(entry.path()) {
                tracing::warn!(file = %name, error = %e, "failed to delete aged file");
                continue;
            }
            outcome.age_deleted += 1;
            outcome.not_send_files += 1;
            outcome.not_send_bytes += size;
            continue;
        }

        if let Some(dup_check) = &msg.dup_check {
            let verdict = dup_check
                .check(&dup_ledger, &name, None, now)
                .unwrap_or(DupVerdict::Fresh);
            if let DupVerdict::Duplicate(action) = verdict {
                match action {
                    DupAction::Delete => {
                        tracing::info!(file = %name, "OT_DUPLICATE_DELETE: deleting");
                        if std::fs::remove_file(entry.path()).is_ok() {
                            outcome.dup_deleted += 1;
                            outcome.not_send_files += 1;
                            outcome.not_send_bytes += size;
                        }
                        continue;
                    }
                    DupAction::Store => {
                        let store = workdir.store_dir().join(msg.job_id.to_string());
                        let stored = store.join(&name);
                        let moved = std::fs::create_dir_all(&store)
                            .and_then(|()| std::fs::rename(entry.path(), &stored));
                        match moved {
                            Ok(()) => {
                                tracing::info!(file = %name, "OT_DUPLICATE_STORED: moved aside");
                                outcome.dup_stored += 1;
                                outcome.not_send_files += 1;
                                outcome.not_send_bytes += size;
                                continue;
                            }
                            Err(e) => {
                                tracing::warn!(file = %name, error = %e,
                                    "failed to store duplicate, sending it instead");
                            }
                        }
                    }
                    DupAction::Warn => {
                        tracing::warn!(file = %name, "duplicate file, sending anyway");
                    }
                }
            }
        }

        outcome.files.push(SpoolFile { path: entry.path(), name, size, mtime });
    }

    if sort {
        outcome.files.sort_by_key(|f| f.mtime);
    }
    Ok(outcome)
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
