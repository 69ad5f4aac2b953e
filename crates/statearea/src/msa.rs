// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Monitor Status Area: one [`MsaRecord`] per monitored remote AFD.

use crate::area::{AreaError, MappedArea};
use crate::header::CURRENT_MSA_VERSION;
use crate::records::{AhlRecord, MsaRecord};
use afd_core::AfdAlias;
use std::path::Path;
use zerocopy::FromZeros;

/// One row of AFD_MON_CONFIG after evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonConfigRow {
    pub alias: AfdAlias,
    pub hostname: String,
    pub port: u16,
    pub poll_interval: u32,
    pub convert_username: Option<(String, String)>,
}

impl MonConfigRow {
    fn to_record(&self) -> MsaRecord {
        let mut r = MsaRecord::new_zeroed();
        r.set_afd_alias(self.alias.as_str());
        r.set_hostname(&self.hostname);
        r.port = i32::from(self.port);
        r.poll_interval = self.poll_interval as i32;
        if let Some((local, remote)) = &self.convert_username {
            r.set_convert_username(0, local);
            r.set_convert_username(1, remote);
        }
        r
    }

    /// The identity the supervisor diffs on reload: rows with an equal
    /// tuple keep their probe process.
    pub fn probe_tuple(&self) -> (String, String, u16, u32) {
        (
            self.alias.as_str().to_string(),
            self.hostname.clone(),
            self.port,
            self.poll_interval,
        )
    }
}

/// Whole-area view over the monitor rows.
pub struct Msa {
    area: MappedArea<MsaRecord>,
}

impl Msa {
    pub fn create(path: &Path, rows: &[MonConfigRow]) -> Result<Self, AreaError> {
        let records: Vec<MsaRecord> = rows.iter().map(MonConfigRow::to_record).collect();
        Ok(Self { area: MappedArea::create(path, CURRENT_MSA_VERSION, &records)? })
    }

    pub fn attach(path: &Path) -> Result<Self, AreaError> {
        Ok(Self { area: MappedArea::attach(path, CURRENT_MSA_VERSION)? })
    }

    pub fn count(&self) -> usize {
        self.area.count()
    }

    pub fn row(&self, pos: usize) -> Result<&MsaRecord, AreaError> {
        self.area.record(pos)
    }

    pub fn row_mut(&mut self, pos: usize) -> Result<&mut MsaRecord, AreaError> {
        self.area.record_mut(pos)
    }

    pub fn position_of(&self, alias: &str) -> Option<usize> {
        self.area.positions().find(|p| {
            self.area.record(*p).map(|r| r.afd_alias() == alias).unwrap_or(false)
        })
    }

    /// True once the area has been rebuilt behind this mapping.
    pub fn is_stale(&self) -> bool {
        self.area.is_stale()
    }

    pub fn detach(self) -> Result<(), AreaError> {
        self.area.detach()
    }
}

/// The per-probe mapped host list, resized by `NH` frames.
pub struct AhlFile {
    area: MappedArea<AhlRecord>,
}

impl AhlFile {
    /// Open or create the AHL for probe `pos`, sized to `no_of_hosts`.
    pub fn open(path: &Path, no_of_hosts: usize) -> Result<Self, AreaError> {
        let mut area = if path.exists() {
            match MappedArea::attach(path, 0) {
                Ok(area) => area,
                Err(_) => MappedArea::create(path, 0, &vec![AhlRecord::new_zeroed(); no_of_hosts])?,
            }
        } else {
            MappedArea::create(path, 0, &vec![AhlRecord::new_zeroed(); no_of_hosts])?
        };
        if area.count() != no_of_hosts {
            area.resize(no_of_hosts)?;
        }
        Ok(Self { area })
    }

    pub fn count(&self) -> usize {
        self.area.count()
    }

    pub fn resize(&mut self, no_of_hosts: usize) -> Result<(), AreaError> {
        self.area.resize(no_of_hosts)
    }

    pub fn row(&self, pos: usize) -> Result<&AhlRecord, AreaError> {
        self.area.record(pos)
    }

    pub fn row_mut(&mut self, pos: usize) -> Result<&mut AhlRecord, AreaError> {
        self.area.record_mut(pos)
    }
}

#[cfg(test)]
#[path = "msa_tests.rs"]
mod tests;
