// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job messages: the static per-job fields cached in the MDB.
//!
//! A message file lives at `messages/<job_id>.json` in the work dir and
//! is parsed once per job id; everything the worker needs beyond its FSA
//! row travels through this struct.

use crate::dest::Destination;
use crate::dupcheck::DupCheck;
use crate::rename::RenameRule;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MsgError {
    #[error("failed to read message file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed message file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// File-locking convention used while a file is being written remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockStyle {
    /// No locking; write under the final name.
    #[default]
    None,
    /// Create a peer lock file for the duration of the transfer.
    Lockfile,
    /// Write `.name`, rename to `name` when complete.
    Dot,
    /// Write `.name.`, rename to `name` (VMS flavour).
    DotVms,
    /// Write `name<suffix>`, rename to `name`.
    Postfix(String),
}

/// Static job fields resolved from the on-disk message file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: u32,
    pub destination: Destination,
    /// FSA position of the target host at message creation time.
    pub fsa_pos: usize,
    #[serde(default)]
    pub lock: LockStyle,
    /// Seconds after which unsent spool files are discarded. 0 disables.
    #[serde(default)]
    pub age_limit: i64,
    /// Seconds archived files are kept. 0 means delete after send.
    #[serde(default)]
    pub archive_time: i64,
    /// Octal mode applied to the stored file, when set.
    #[serde(default)]
    pub chmod: Option<u32>,
    #[serde(default)]
    pub rename_rules: Vec<RenameRule>,
    #[serde(default)]
    pub dup_check: Option<DupCheck>,
    /// Resume partially-sent files from the remote size when not -1.
    #[serde(default = "default_no_offset")]
    pub file_size_offset: i64,
    /// Transfer block size in bytes.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

fn default_no_offset() -> i64 {
    -1
}

fn default_block_size() -> usize {
    4096
}

impl JobMessage {
    /// Parse the message file for `job_id` under `msg_dir`.
    pub fn load(msg_dir: &Path, job_id: u32) -> Result<Self, MsgError> {
        let path = msg_dir.join(format!("{job_id}.json"));
        let bytes = std::fs::read(&path).map_err(|source| MsgError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| MsgError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write the message file; used by producers and tests.
    pub fn store(&self, msg_dir: &Path) -> Result<(), MsgError> {
        let path = msg_dir.join(format!("{}.json", self.job_id));
        let io_err = |source| MsgError::Read { path: path.display().to_string(), source };
        std::fs::create_dir_all(msg_dir).map_err(io_err)?;
        let bytes = serde_json::to_vec_pretty(self).unwrap_or_default();
        std::fs::write(&path, bytes).map_err(io_err)
    }

    /// Name a file gets while the transfer is in flight.
    pub fn in_flight_name(&self, final_name: &str) -> String {
        match &self.lock {
            LockStyle::None | LockStyle::Lockfile => final_name.to_string(),
            LockStyle::Dot => format!(".{final_name}"),
            LockStyle::DotVms => format!(".{final_name}."),
            LockStyle::Postfix(suffix) => format!("{final_name}{suffix}"),
        }
    }
}

#[cfg(test)]
#[path = "msg_tests.rs"]
mod tests;
