// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-range locks over the mapped area files.
//!
//! Each host record exposes three independent lock domains so writers to
//! different counters on the same host do not serialize against each
//! other. The guard releases its range on drop, panic included.

use crate::header::AFD_WORD_OFFSET;
use crate::records::HostRecord;
use std::fs::File;
use std::mem::offset_of;
use std::os::unix::io::AsRawFd;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("fcntl lock failed: {0}")]
    Fcntl(std::io::Error),
}

/// The three per-host lock domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDomain {
    /// total-file-counter / total-file-size aggregates.
    Tfc,
    /// error counter.
    Ec,
    /// host-status flag word.
    Hs,
}

impl LockDomain {
    /// Byte offset of the domain's anchor field within a host record.
    pub fn field_offset(self) -> usize {
        match self {
            LockDomain::Tfc => offset_of!(HostRecord, total_file_counter),
            LockDomain::Ec => offset_of!(HostRecord, error_counter),
            LockDomain::Hs => offset_of!(HostRecord, host_status),
        }
    }

    /// Absolute file offset of the lock byte for host `pos`.
    pub fn file_offset(self, pos: usize) -> i64 {
        (AFD_WORD_OFFSET + pos * std::mem::size_of::<HostRecord>() + self.field_offset()) as i64
    }
}

/// A held byte-range write lock; released on drop.
///
/// Holds the raw descriptor only: the caller keeps the `File` open for
/// at least as long as the guard lives (the area wrappers always do,
/// they own the file for the life of the mapping).
#[derive(Debug)]
pub struct RangeLock {
    fd: std::os::unix::io::RawFd,
    start: i64,
}

impl RangeLock {
    /// Block until the 1-byte range at `start` is exclusively locked.
    pub fn acquire(file: &File, start: i64) -> Result<Self, LockError> {
        let fd = file.as_raw_fd();
        fcntl_lock(fd, libc::F_WRLCK, start)?;
        Ok(Self { fd, start })
    }
}

impl Drop for RangeLock {
    fn drop(&mut self) {
        // Nothing useful to do on unlock failure at this point.
        let _ = fcntl_lock(self.fd, libc::F_UNLCK, self.start);
    }
}

fn fcntl_lock(fd: std::os::unix::io::RawFd, kind: i32, start: i64) -> Result<(), LockError> {
    let mut fl: libc::flock = unsafe { std::mem::zeroed() };
    fl.l_type = kind as libc::c_short;
    fl.l_whence = libc::SEEK_SET as libc::c_short;
    fl.l_start = start as libc::off_t;
    fl.l_len = 1;
    let rc = unsafe { libc::fcntl(fd, libc::F_SETLKW, &fl) };
    if rc == -1 {
        return Err(LockError::Fcntl(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
