// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Fileretrieve Status Area: one [`DirRecord`] per fetch directory.

use crate::area::{AreaCheck, AreaError, MappedArea};
use crate::header::CURRENT_FRA_VERSION;
use crate::records::DirRecord;
use afd_core::{DirAlias, TriSign};
use std::path::Path;
use zerocopy::FromZeros;

/// Static fetch-directory configuration used to build an FRA.
#[derive(Debug, Clone)]
pub struct DirConfig {
    pub alias: DirAlias,
    pub url: String,
    pub fsa_pos: i32,
    pub poll_interval: u32,
    pub keep_connected: u32,
    pub ignore_size: Option<(TriSign, i64)>,
    pub ignore_file_time: Option<(TriSign, i64)>,
    pub stupid_mode: u8,
    pub remove: u8,
}

impl DirConfig {
    pub fn new(alias: impl Into<DirAlias>, url: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            url: url.into(),
            fsa_pos: -1,
            poll_interval: 60,
            keep_connected: 0,
            ignore_size: None,
            ignore_file_time: None,
            stupid_mode: 0,
            remove: 0,
        }
    }

    fn to_record(&self) -> DirRecord {
        let mut r = DirRecord::new_zeroed();
        r.set_dir_alias(self.alias.as_str());
        r.set_url(&self.url);
        r.fsa_pos = self.fsa_pos;
        r.poll_interval = self.poll_interval;
        r.keep_connected = self.keep_connected;
        if let Some((sign, size)) = self.ignore_size {
            r.gt_lt_sign_size = tri_sign_byte(sign);
            r.ignore_size = size;
        }
        if let Some((sign, age)) = self.ignore_file_time {
            r.gt_lt_sign_time = tri_sign_byte(sign);
            r.ignore_file_time = age;
        }
        r.stupid_mode = self.stupid_mode;
        r.remove = self.remove;
        r
    }
}

pub(crate) fn tri_sign_byte(sign: TriSign) -> u8 {
    match sign {
        TriSign::Equal => 0,
        TriSign::LessThan => 1,
        TriSign::GreaterThan => 2,
    }
}

pub(crate) fn tri_sign_from_byte(b: u8) -> TriSign {
    match b {
        1 => TriSign::LessThan,
        2 => TriSign::GreaterThan,
        _ => TriSign::Equal,
    }
}

/// Whole-area view over the fetch directories.
pub struct Fra {
    area: MappedArea<DirRecord>,
}

impl Fra {
    pub fn create(path: &Path, dirs: &[DirConfig]) -> Result<Self, AreaError> {
        let records: Vec<DirRecord> = dirs.iter().map(DirConfig::to_record).collect();
        Ok(Self { area: MappedArea::create(path, CURRENT_FRA_VERSION, &records)? })
    }

    pub fn attach(path: &Path) -> Result<Self, AreaError> {
        Ok(Self { area: MappedArea::attach(path, CURRENT_FRA_VERSION)? })
    }

    pub fn count(&self) -> usize {
        self.area.count()
    }

    pub fn dir(&self, pos: usize) -> Result<&DirRecord, AreaError> {
        self.area.record(pos)
    }

    pub fn dir_mut(&mut self, pos: usize) -> Result<&mut DirRecord, AreaError> {
        self.area.record_mut(pos)
    }

    pub fn position_of(&self, alias: &str) -> Option<usize> {
        self.area.positions().find(|p| {
            self.area.record(*p).map(|r| r.dir_alias() == alias).unwrap_or(false)
        })
    }

    /// Fetch directories whose next check is due.
    pub fn due(&self, now: i64) -> Vec<usize> {
        self.area
            .positions()
            .filter(|p| {
                self.area
                    .record(*p)
                    .map(|r| {
                        r.queued == 0
                            && r.dir_flag & crate::records::DIR_DISABLED == 0
                            && r.next_check_time <= now
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn check(&mut self, alias: &str) -> Result<AreaCheck, AreaError> {
        self.area.check(|area| {
            area.positions().find(|p| {
                area.record(*p).map(|r| r.dir_alias() == alias).unwrap_or(false)
            })
        })
    }

    pub fn is_stale(&self) -> bool {
        self.area.is_stale()
    }

    pub fn detach(self) -> Result<(), AreaError> {
        self.area.detach()
    }
}

#[cfg(test)]
#[path = "fra_tests.rs"]
mod tests;
