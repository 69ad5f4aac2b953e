// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-dir resolution and the on-disk layout beneath it.
//!
//! Every AFD process takes `-w <workdir>`, falling back to the
//! `AFD_WORK_DIR` (or `MON_WORK_DIR` for monitor processes) environment
//! variable. All fifos, status areas, and spools live at fixed paths
//! below the work dir.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkDirError {
    #[error("no work dir: pass -w or set {0}")]
    Unresolved(&'static str),
    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Environment variable consulted by the main AFD processes.
pub const AFD_WORK_DIR_ENV: &str = "AFD_WORK_DIR";
/// Environment variable consulted by the monitor processes.
pub const MON_WORK_DIR_ENV: &str = "MON_WORK_DIR";

/// Resolved work dir with typed accessors for everything under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Resolve from an explicit `-w` value or the named env variable.
    pub fn resolve(flag: Option<PathBuf>, env_name: &'static str) -> Result<Self, WorkDirError> {
        let root = match flag {
            Some(p) => p,
            None => std::env::var_os(env_name)
                .map(PathBuf::from)
                .ok_or(WorkDirError::Unresolved(env_name))?,
        };
        Ok(Self { root })
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Named pipes, active files, and the status-area files.
    pub fn fifo_dir(&self) -> PathBuf {
        self.root.join("fifodir")
    }

    pub fn etc_dir(&self) -> PathBuf {
        self.root.join("etc")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    /// Per-job message metadata files.
    pub fn msg_dir(&self) -> PathBuf {
        self.root.join("messages")
    }

    /// Outbound spool: `files/outgoing/<msg_name>/<file>`.
    pub fn outgoing_dir(&self) -> PathBuf {
        self.root.join("files").join("outgoing")
    }

    /// Duplicate storage: `files/store/<job-id>/<file>`.
    pub fn store_dir(&self) -> PathBuf {
        self.root.join("files").join("store")
    }

    /// Retrieve-list files: `files/incoming/ls_data/<dir_alias>`.
    pub fn ls_data_dir(&self) -> PathBuf {
        self.root.join("files").join("incoming").join("ls_data")
    }

    /// Landing area for fetched files.
    pub fn incoming_dir(&self) -> PathBuf {
        self.root.join("files").join("incoming")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join("archive")
    }

    pub fn fsa_file(&self) -> PathBuf {
        self.fifo_dir().join("fsa_status")
    }

    pub fn fra_file(&self) -> PathBuf {
        self.fifo_dir().join("fra_status")
    }

    pub fn msa_file(&self) -> PathBuf {
        self.fifo_dir().join("mon_status")
    }

    pub fn mon_active_file(&self) -> PathBuf {
        self.fifo_dir().join("AFD_MON_ACTIVE")
    }

    pub fn afd_mon_config(&self) -> PathBuf {
        self.etc_dir().join("AFD_MON_CONFIG")
    }

    pub fn permissions_file(&self) -> PathBuf {
        self.etc_dir().join("permissions")
    }

    /// Mapped host list maintained by probe `pos`.
    pub fn ahl_file(&self, pos: usize) -> PathBuf {
        self.fifo_dir().join(format!("afd_host_list.{pos}"))
    }

    /// Create the directory skeleton, tolerating an existing tree.
    pub fn ensure_layout(&self) -> Result<(), WorkDirError> {
        for dir in [
            self.fifo_dir(),
            self.etc_dir(),
            self.log_dir(),
            self.msg_dir(),
            self.outgoing_dir(),
            self.store_dir(),
            self.ls_data_dir(),
            self.archive_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|source| WorkDirError::Create {
                path: dir.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "workdir_tests.rs"]
mod tests;
