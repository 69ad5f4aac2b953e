// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The MON_ACTIVE file: pids of the supervisor and its probes.
//!
//! Rewritten whenever the probe set changes so that a dead supervisor's
//! children can still be taken down before a restart.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActiveFileError {
    #[error("active file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("active file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of `fifodir/AFD_MON_ACTIVE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActiveFile {
    pub supervisor_pid: i32,
    /// One pid per MSA row; 0 for rows with no running probe.
    pub probe_pids: Vec<i32>,
}

/// Write the active file atomically.
pub fn write_active_file(path: &Path, active: &ActiveFile) -> Result<(), ActiveFileError> {
    let io_err = |source| ActiveFileError::Io { path: path.display().to_string(), source };
    let tmp = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(active).unwrap_or_default();
    std::fs::write(&tmp, bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}

/// Read the active file; `None` when absent.
pub fn read_active_file(path: &Path) -> Result<Option<ActiveFile>, ActiveFileError> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ActiveFileError::Corrupt {
                path: path.display().to_string(),
                source,
            }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => {
            Err(ActiveFileError::Io { path: path.display().to_string(), source })
        }
    }
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
