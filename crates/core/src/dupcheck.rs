// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplicate detection for outgoing files.
//!
//! A duplicate is not an error: depending on the job it is deleted,
//! stored aside under `files/store/<job-id>/`, or merely logged. The
//! check hashes the file name (optionally the content) and remembers
//! hashes in a small per-job ledger file with a sliding timeout.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DupCheckError {
    #[error("failed to read dup ledger {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write dup ledger {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt dup ledger {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What to do with a detected duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DupAction {
    /// Delete the spool file.
    Delete,
    /// Move the spool file under the job's store directory.
    Store,
    /// Log a warning and send the file anyway.
    #[default]
    Warn,
}

/// Result of a duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DupVerdict {
    Fresh,
    Duplicate(DupAction),
}

/// Duplicate-check configuration resolved from the job message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DupCheck {
    /// Seconds a remembered hash stays valid. 0 disables the check.
    pub timeout: i64,
    pub action: DupAction,
    /// Hash file content in addition to the name.
    #[serde(default)]
    pub content: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    seen: HashMap<String, i64>,
}

impl DupCheck {
    /// Check `name` (and optionally `payload`) against the ledger at
    /// `ledger_path`, recording it when fresh.
    pub fn check(
        &self,
        ledger_path: &Path,
        name: &str,
        payload: Option<&[u8]>,
        now: i64,
    ) -> Result<DupVerdict, DupCheckError> {
        if self.timeout <= 0 {
            return Ok(DupVerdict::Fresh);
        }

        let mut ledger = load_ledger(ledger_path)?;
        ledger.seen.retain(|_, seen_at| now - *seen_at <= self.timeout);

        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        if self.content {
            if let Some(bytes) = payload {
                hasher.update(bytes);
            }
        }
        let key = format!("{:x}", hasher.finalize());

        let verdict = if ledger.seen.contains_key(&key) {
            DupVerdict::Duplicate(self.action)
        } else {
            DupVerdict::Fresh
        };
        ledger.seen.insert(key, now);
        store_ledger(ledger_path, &ledger)?;
        Ok(verdict)
    }
}

fn load_ledger(path: &Path) -> Result<Ledger, DupCheckError> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| DupCheckError::Corrupt {
            path: path.display().to_string(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Ledger::default()),
        Err(source) => Err(DupCheckError::Read { path: path.display().to_string(), source }),
    }
}

fn store_ledger(path: &Path, ledger: &Ledger) -> Result<(), DupCheckError> {
    let io_err = |source| DupCheckError::Write { path: path.display().to_string(), source };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    let bytes = serde_json::to_vec(ledger).unwrap_or_default();
    std::fs::write(&tmp, bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
#[path = "dupcheck_tests.rs"]
mod tests;
