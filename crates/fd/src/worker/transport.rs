// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The protocol seam of a transfer worker.
//!
//! Everything the send and fetch loops need from a protocol session is
//! behind [`Transport`]; the `loc` implementation drives the local
//! filesystem and is the one exercised end-to-end. Burst compatibility
//! decisions never reach this trait: they are made on the destination
//! metadata before a connection is reused.

use afd_core::TransferExit;
use std::io::{Read, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Worker-side transfer failure, one variant per exit class.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("connect failed: {0}")]
    Connect(std::io::Error),
    #[error("auth failed: {0}")]
    Auth(String),
    #[error("chdir to `{dir}` failed: {source}")]
    Chdir {
        dir: String,
        #[source]
        source: std::io::Error,
    },
    #[error("open remote `{name}` failed: {source}")]
    OpenRemote {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("write remote failed: {0}")]
    WriteRemote(std::io::Error),
    #[error("close remote failed: {0}")]
    CloseRemote(std::io::Error),
    #[error("open local `{name}` failed: {source}")]
    OpenLocal {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("read local failed: {0}")]
    ReadLocal(std::io::Error),
    #[error("write local failed: {0}")]
    WriteLocal(std::io::Error),
    #[error("move failed: {0}")]
    Move(std::io::Error),
    #[error("rename failed: {0}")]
    Rename(std::io::Error),
    #[error("remove lockfile failed: {0}")]
    RemoveLockfile(std::io::Error),
    #[error("operation timed out")]
    Timeout,
    #[error("status area error: {0}")]
    StateArea(String),
}

impl TransferError {
    /// The process exit code this failure maps to.
    pub fn exit(&self) -> TransferExit {
        match self {
            TransferError::Connect(_) => TransferExit::ConnectError,
            TransferError::Auth(_) => TransferExit::AuthError,
            TransferError::Chdir { .. } => TransferExit::ChdirError,
            TransferError::OpenRemote { .. } => TransferExit::OpenRemoteError,
            TransferError::WriteRemote(_) => TransferExit::WriteRemoteError,
            TransferError::CloseRemote(_) => TransferExit::CloseRemoteError,
            TransferError::OpenLocal { .. } => TransferExit::OpenLocalError,
            TransferError::ReadLocal(_) => TransferExit::ReadLocalError,
            TransferError::WriteLocal(_) => TransferExit::WriteLocalError,
            TransferError::Move(_) => TransferExit::MoveError,
            TransferError::Rename(_) => TransferExit::RenameError,
            TransferError::RemoveLockfile(_) => TransferExit::RemoveLockfileError,
            TransferError::Timeout => TransferExit::Timeout,
            TransferError::StateArea(_) => TransferExit::IsFaulty,
        }
    }
}

/// One file found by a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub size: i64,
    pub mtime: i64,
}

/// A protocol session, one per worker connection.
pub trait Transport {
    /// Establish the session and authenticate.
    fn connect(&mut self) -> Result<(), TransferError>;

    /// Enter the target directory, creating it when allowed.
    fn enter_dir(&mut self, create: bool) -> Result<(), TransferError>;

    /// Size of the remote file, for append/resume.
    fn remote_size(&mut self, name: &str) -> Result<Option<u64>, TransferError>;

    /// Open the remote file for writing at `offset`.
    fn open_remote(
        &mut self,
        name: &str,
        offset: u64,
    ) -> Result<Box<dyn Write + Send>, TransferError>;

    /// Rename an in-flight name to its final name.
    fn finalize(&mut self, from: &str, to: &str) -> Result<(), TransferError>;

    fn set_mode(&mut self, name: &str, mode: u32) -> Result<(), TransferError>;

    fn remove_remote(&mut self, name: &str) -> Result<(), TransferError>;

    /// List the current directory (fetch side).
    fn list(&mut self) -> Result<Vec<RemoteEntry>, TransferError>;

    /// Open a remote file for reading (fetch side).
    fn open_read(&mut self, name: &str) -> Result<Box<dyn Read + Send>, TransferError>;

    /// Close the session cleanly.
    fn quit(&mut self) -> Result<(), TransferError>;
}

/// Local-filesystem transport: "send" moves or copies into a target
/// directory, "fetch" reads out of a source directory.
pub struct LocTransport {
    dir: PathBuf,
    connected: bool,
}

impl LocTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), connected: false }
    }

    fn target(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Transport for LocTransport {
    fn connect(&mut self) -> Result<(), TransferError> {
        self.connected = true;
        Ok(())
    }

    fn enter_dir(&mut self, create: bool) -> Result<(), TransferError> {
        if self.dir.is_dir() {
            return Ok(());
        }
        if create {
            std::fs::create_dir_all(&self.dir).map_err(|source| TransferError::Chdir {
                dir: self.dir.display().to_string(),
                source,
            })
        } else {
            Err(TransferError::Chdir {
                dir: self.dir.display().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    fn remote_size(&mut self, name: &str) -> Result<Option<u64>, TransferError> {
        match std::fs::metadata(self.target(name)) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TransferError::OpenRemote { name: name.to_string(), source }),
        }
    }

    fn open_remote(
        &mut self,
        name: &str,
        offset: u64,
    ) -> Result<Box<dyn Write + Send>, TransferError> {
        use std::io::Seek;
        let path = self.target(name);
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(offset == 0)
            .open(&path)
            .map_err(|source| TransferError::OpenRemote { name: name.to_string(), source })?;
        if offset > 0 {
            file.seek(std::io::SeekFrom::Start(offset)).map_err(TransferError::WriteRemote)?;
        }
        Ok(Box::new(file))
    }

    fn finalize(&mut self, from: &str, to: &str) -> Result<(), TransferError> {
        std::fs::rename(self.target(from), self.target(to)).map_err(TransferError::Rename)
    }

    fn set_mode(&mut self, name: &str, mode: u32) -> Result<(), TransferError> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(self.target(name), std::fs::Permissions::from_mode(mode))
            .map_err(TransferError::WriteRemote)
    }

    fn remove_remote(&mut self, name: &str) -> Result<(), TransferError> {
        std::fs::remove_file(self.target(name)).map_err(TransferError::WriteRemote)
    }

    fn list(&mut self) -> Result<Vec<RemoteEntry>, TransferError> {
        let read = std::fs::read_dir(&self.dir).map_err(|source| TransferError::Chdir {
            dir: self.dir.display().to_string(),
            source,
        })?;
        let mut out = Vec::new();
        for entry in read {
            let entry = entry.map_err(TransferError::ReadLocal)?;
            let meta = entry.metadata().map_err(TransferError::ReadLocal)?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            // Dotfiles are in-flight writes, never listed as available.
            if name.starts_with('.') {
                continue;
            }
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            out.push(RemoteEntry { name, size: meta.len() as i64, mtime });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn open_read(&mut self, name: &str) -> Result<Box<dyn Read + Send>, TransferError> {
        let path = self.target(name);
        let file = std::fs::File::open(&path)
            .map_err(|source| TransferError::OpenRemote { name: name.to_string(), source })?;
        Ok(Box::new(file))
    }

    fn quit(&mut self) -> Result<(), TransferError> {
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
