// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Filetransfer Status Area: one [`HostRecord`] per configured host.
//!
//! Supervisors attach to the whole area; a transfer worker attaches a
//! [`FsaSingle`] pinned to its host position and re-validates it before
//! every mutation.

use crate::area::{AreaCheck, AreaError, MappedArea};
use crate::header::CURRENT_FSA_VERSION;
use crate::locks::{LockDomain, LockError, RangeLock};
use crate::records::HostRecord;
use afd_core::{HostAlias, MAX_SLOTS};
use std::path::Path;
use thiserror::Error;
use zerocopy::FromZeros;

#[derive(Debug, Error)]
pub enum FsaError {
    #[error(transparent)]
    Area(#[from] AreaError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("host {0} not present in FSA")]
    NoSuchHost(String),
}

/// Static host configuration used to build an FSA.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub alias: HostAlias,
    pub real_hostname: [String; 2],
    pub allowed_transfers: u32,
    pub max_errors: u32,
    pub transfer_timeout: i64,
    pub keep_connected: u32,
    pub transfer_rate_limit: u64,
    pub host_status: u32,
}

impl HostConfig {
    pub fn new(alias: impl Into<HostAlias>) -> Self {
        Self {
            alias: alias.into(),
            real_hostname: [String::new(), String::new()],
            allowed_transfers: 1,
            max_errors: 10,
            transfer_timeout: 120,
            keep_connected: 0,
            transfer_rate_limit: 0,
            host_status: 0,
        }
    }

    fn to_record(&self) -> HostRecord {
        let mut r = HostRecord::new_zeroed();
        r.set_host_alias(self.alias.as_str());
        r.set_real_hostname(0, &self.real_hostname[0]);
        r.set_real_hostname(1, &self.real_hostname[1]);
        r.host_toggle = 1;
        r.allowed_transfers = self.allowed_transfers.clamp(1, MAX_SLOTS as u32);
        r.max_errors = self.max_errors;
        r.transfer_timeout = self.transfer_timeout;
        r.keep_connected = self.keep_connected;
        r.transfer_rate_limit = self.transfer_rate_limit;
        r.host_status = self.host_status;
        r
    }
}

/// Whole-area view used by the FD supervisor and control tools.
pub struct Fsa {
    area: MappedArea<HostRecord>,
}

impl Fsa {
    /// Write a new FSA from configuration (tmp + rename over any old one).
    pub fn create(path: &Path, hosts: &[HostConfig]) -> Result<Self, FsaError> {
        let records: Vec<HostRecord> = hosts.iter().map(HostConfig::to_record).collect();
        let area = MappedArea::create(path, CURRENT_FSA_VERSION, &records)?;
        Ok(Self { area })
    }

    pub fn attach(path: &Path) -> Result<Self, FsaError> {
        Ok(Self { area: MappedArea::attach(path, CURRENT_FSA_VERSION)? })
    }

    pub fn count(&self) -> usize {
        self.area.count()
    }

    pub fn host(&self, pos: usize) -> Result<&HostRecord, FsaError> {
        Ok(self.area.record(pos)?)
    }

    pub fn host_mut(&mut self, pos: usize) -> Result<&mut HostRecord, FsaError> {
        Ok(self.area.record_mut(pos)?)
    }

    pub fn position_of(&self, alias: &str) -> Option<usize> {
        self.area.positions().find(|p| {
            self.area.record(*p).map(|r| r.host_alias() == alias).unwrap_or(false)
        })
    }

    /// Run `mutate` on the host record while holding one lock domain.
    pub fn with_host_lock<T>(
        &mut self,
        pos: usize,
        domain: LockDomain,
        mutate: impl FnOnce(&mut HostRecord) -> T,
    ) -> Result<T, FsaError> {
        let offset = domain.file_offset(pos);
        let guard = RangeLock::acquire(self.area.file(), offset)?;
        let result = mutate(self.area.record_mut(pos)?);
        drop(guard);
        Ok(result)
    }

    pub fn check(&mut self, alias: &str) -> Result<AreaCheck, FsaError> {
        Ok(self.area.check(|area| {
            area.positions().find(|p| {
                area.record(*p).map(|r| r.host_alias() == alias).unwrap_or(false)
            })
        })?)
    }

    pub fn is_stale(&self) -> bool {
        self.area.is_stale()
    }

    pub fn detach(self) -> Result<(), FsaError> {
        Ok(self.area.detach()?)
    }
}

/// A worker's view: the whole mapping, pinned to one host position.
///
/// `verify` re-runs the stale check before mutations; a worker whose
/// host vanished must quiesce (spec: clear the slot marker and exit).
pub struct FsaSingle {
    area: MappedArea<HostRecord>,
    alias: String,
    pos: usize,
}

impl FsaSingle {
    pub fn attach_pos(path: &Path, pos: usize) -> Result<Self, FsaError> {
        let area: MappedArea<HostRecord> = MappedArea::attach(path, CURRENT_FSA_VERSION)?;
        let alias = area.record(pos)?.host_alias().to_string();
        Ok(Self { area, alias, pos })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn host(&self) -> Result<&HostRecord, FsaError> {
        Ok(self.area.record(self.pos)?)
    }

    pub fn host_mut(&mut self) -> Result<&mut HostRecord, FsaError> {
        Ok(self.area.record_mut(self.pos)?)
    }

    /// Stale check; re-locates the host by alias after a regeneration.
    ///
    /// Returns `false` when the host is gone and the worker must stop
    /// touching the area.
    pub fn verify(&mut self) -> Result<bool, FsaError> {
        let alias = self.alias.clone();
        match self.area.check(|area| {
            area.positions().find(|p| {
                area.record(*p).map(|r| r.host_alias() == alias.as_str()).unwrap_or(false)
            })
        })? {
            AreaCheck::Unchanged => Ok(true),
            AreaCheck::ReattachedAndFound(pos) => {
                self.pos = pos;
                Ok(true)
            }
            AreaCheck::ReattachedButGone => Ok(false),
        }
    }

    pub fn with_lock<T>(
        &mut self,
        domain: LockDomain,
        mutate: impl FnOnce(&mut HostRecord) -> T,
    ) -> Result<T, FsaError> {
        let offset = domain.file_offset(self.pos);
        let guard = RangeLock::acquire(self.area.file(), offset)?;
        let result = mutate(self.area.record_mut(self.pos)?);
        drop(guard);
        Ok(result)
    }
}

#[cfg(test)]
#[path = "fsa_tests.rs"]
mod tests;
