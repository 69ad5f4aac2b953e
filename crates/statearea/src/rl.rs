// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The retrieve list: per-directory record of discovered remote files.
//!
//! Backed by a mapped file under `files/incoming/ls_data/<dir_alias>`,
//! growing in chunks of [`RETRIEVE_LIST_STEP_SIZE`] entries. Two legacy
//! layouts are still converted on attach: the original one stored the
//! remote mtime as an ASCII `YYYYMMDDHHMMSS` string, its successor as a
//! 32-bit size. Conversions write a fresh file and rename it into place.
//!
//! Stupid and remove fetch modes keep the list purely in memory: there
//! is nothing worth remembering across runs, and any stale on-disk list
//! is deleted on attach.

use crate::header::{AreaHeader, AFD_WORD_OFFSET};
use afd_core::{ignore_mtime, ignore_size, TriSign};
use chrono::NaiveDateTime;
use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

/// Entries are allocated in chunks of this many records.
pub const RETRIEVE_LIST_STEP_SIZE: usize = 50;

pub const CURRENT_RL_VERSION: u8 = 2;
const LEGACY_ASCII_VERSION: u8 = 0;
const LEGACY_INT_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum RlError {
    #[error("retrieve list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("retrieve list {0} has an unusable layout")]
    BadLayout(String),
}

/// One discovered remote file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct RlEntry {
    pub size: i64,
    pub file_mtime: i64,
    file_name: [u8; 128],
    pub got_date: u8,
    pub retrieved: u8,
    pub in_list: u8,
    /// Slot index of the worker fetching this entry, plus one. 0 = free.
    pub assigned: u8,
    _pad: [u8; 4],
}

impl RlEntry {
    pub fn file_name(&self) -> &str {
        crate::records::fixed_str(&self.file_name)
    }

    pub fn set_file_name(&mut self, name: &str) {
        crate::records::set_fixed_str(&mut self.file_name, name);
    }
}

/// The original layout: mtime as an ASCII date string.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct LegacyAsciiEntry {
    file_name: [u8; 128],
    date: [u8; 16],
    size: i64,
    retrieved: u8,
    in_list: u8,
    _pad: [u8; 6],
}

/// The interim layout: binary mtime missing, 32-bit size.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct LegacyIntEntry {
    file_name: [u8; 128],
    date: [u8; 16],
    size: i32,
    retrieved: u8,
    in_list: u8,
    _pad: [u8; 2],
}

const STRIDE: usize = std::mem::size_of::<RlEntry>();

const _: () = {
    assert!(std::mem::size_of::<RlEntry>() == 152);
    assert!(std::mem::size_of::<LegacyAsciiEntry>() == 160);
    assert!(std::mem::size_of::<LegacyIntEntry>() == 152);
};

/// Persistence behavior requested by the owning fetch directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StupidMode {
    /// Full bookkeeping: remember every file and its retrieved state.
    #[default]
    No,
    /// No memory at all; every listing pass sees a fresh world.
    Yes,
    /// Remember retrieved files only to fetch each exactly once.
    GetOnceOnly,
}

/// Filters applied while a listing pass feeds `check_list`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub stupid_mode: StupidMode,
    pub ignore_size: Option<(TriSign, i64)>,
    pub ignore_file_time: Option<(TriSign, i64)>,
}

/// Verdict for one listed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    Fetch,
    Skip,
}

enum Backing {
    Mapped { file: std::fs::File, map: MmapMut, path: PathBuf },
    // u64 words keep the in-memory image 8-aligned for the record casts.
    Transient(Vec<u64>),
}

/// Per-directory retrieve list.
pub struct RetrieveList {
    backing: Backing,
}

fn chunks_for(count: usize) -> usize {
    count.div_ceil(RETRIEVE_LIST_STEP_SIZE).max(1)
}

/// File size the layout demands for `count` current-version entries.
pub fn expected_file_size(count: usize) -> u64 {
    (AFD_WORD_OFFSET + chunks_for(count) * RETRIEVE_LIST_STEP_SIZE * STRIDE) as u64
}

fn empty_image() -> Vec<u8> {
    let mut bytes = vec![0u8; AFD_WORD_OFFSET + RETRIEVE_LIST_STEP_SIZE * STRIDE];
    let header = AreaHeader::new(0, CURRENT_RL_VERSION);
    bytes[..AFD_WORD_OFFSET].copy_from_slice(header.as_bytes());
    bytes
}

fn empty_words() -> Vec<u64> {
    let image = empty_image();
    let mut words = vec![0u64; image.len() / 8];
    words.as_mut_bytes().copy_from_slice(&image);
    words
}

impl RetrieveList {
    /// Attach the list for `alias`, converting or discarding legacy files.
    ///
    /// `transient` (stupid or remove mode) keeps the list in memory and
    /// deletes any on-disk leftover.
    pub fn attach(ls_data_dir: &Path, alias: &str, transient: bool) -> Result<Self, RlError> {
        let path = ls_data_dir.join(alias);
        if transient {
            if path.exists() {
                let _ = std::fs::remove_file(&path);
            }
            return Ok(Self { backing: Backing::Transient(empty_words()) });
        }

        let io_err = |source| RlError::Io { path: path.display().to_string(), source };
        std::fs::create_dir_all(ls_data_dir).map_err(io_err)?;

        if path.exists() {
            convert_or_discard(&path)?;
        } else {
            let tmp = path.with_extension("tmp");
            std::fs::write(&tmp, empty_image()).map_err(io_err)?;
            std::fs::rename(&tmp, &path).map_err(io_err)?;
        }

        let file = OpenOptions::new().read(true).write(true).open(&path).map_err(io_err)?;
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(io_err)?;
        Ok(Self { backing: Backing::Mapped { file, map, path } })
    }

    /// Delete the backing file for a directory that left the FRA.
    pub fn remove(ls_data_dir: &Path, alias: &str) -> Result<(), RlError> {
        let path = ls_data_dir.join(alias);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(RlError::Io { path: path.display().to_string(), source }),
        }
    }

    fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped { map, .. } => map,
            Backing::Transient(words) => words.as_bytes(),
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.backing {
            Backing::Mapped { map, .. } => map,
            Backing::Transient(words) => words.as_mut_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        AreaHeader::read_from_bytes(&self.bytes()[..AFD_WORD_OFFSET])
            .map(|h| h.count.max(0) as usize)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_len(&mut self, count: usize) {
        if let Ok(header) = AreaHeader::mut_from_bytes(&mut self.bytes_mut()[..AFD_WORD_OFFSET]) {
            header.count = count as i32;
        }
    }

    pub fn entries(&self) -> &[RlEntry] {
        let count = self.len();
        let end = AFD_WORD_OFFSET + count * STRIDE;
        <[RlEntry]>::ref_from_bytes(&self.bytes()[AFD_WORD_OFFSET..end]).unwrap_or_default()
    }

    pub fn entries_mut(&mut self) -> &mut [RlEntry] {
        let count = self.len();
        let end = AFD_WORD_OFFSET + count * STRIDE;
        <[RlEntry]>::mut_from_bytes(&mut self.bytes_mut()[AFD_WORD_OFFSET..end])
            .unwrap_or_default()
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.file_name() == name)
    }

    /// Grow the backing store to hold at least `count` entries, stepping
    /// by whole chunks.
    fn reserve(&mut self, count: usize) -> Result<(), RlError> {
        let needed = expected_file_size(count) as usize;
        match &mut self.backing {
            Backing::Transient(words) => {
                if words.len() * 8 < needed {
                    words.resize(needed / 8, 0);
                }
            }
            Backing::Mapped { file, map, path } => {
                if map.len() < needed {
                    let io_err =
                        |source| RlError::Io { path: path.display().to_string(), source };
                    map.flush().map_err(io_err)?;
                    file.set_len(needed as u64).map_err(io_err)?;
                    *map = unsafe { MmapMut::map_mut(&*file) }.map_err(io_err)?;
                }
            }
        }
        Ok(())
    }

    /// Shrink the backing store to the smallest chunk boundary holding
    /// the current count.
    fn shrink_to_fit(&mut self) -> Result<(), RlError> {
        let needed = expected_file_size(self.len()) as usize;
        match &mut self.backing {
            Backing::Transient(words) => {
                if words.len() * 8 > needed {
                    words.truncate(needed / 8);
                }
            }
            Backing::Mapped { file, map, path } => {
                if map.len() > needed {
                    let io_err =
                        |source| RlError::Io { path: path.display().to_string(), source };
                    map.flush().map_err(io_err)?;
                    file.set_len(needed as u64).map_err(io_err)?;
                    *map = unsafe { MmapMut::map_mut(&*file) }.map_err(io_err)?;
                }
            }
        }
        Ok(())
    }

    /// Start of a listing pass: presume every entry gone until seen.
    pub fn mark_not_in_list_all(&mut self) {
        for entry in self.entries_mut() {
            entry.in_list = 0;
        }
    }

    /// Record one listed file and decide whether to fetch it.
    pub fn check_list(
        &mut self,
        name: &str,
        size: i64,
        mtime: i64,
        opts: &ListOptions,
        now: i64,
    ) -> Result<FetchDecision, RlError> {
        let pos = match self.position_of(name) {
            Some(pos) => {
                let entry = &mut self.entries_mut()[pos];
                entry.in_list = 1;
                if opts.stupid_mode == StupidMode::GetOnceOnly && entry.retrieved == 1 {
                    return Ok(FetchDecision::Skip);
                }
                if entry.size != size || entry.file_mtime != mtime {
                    entry.retrieved = 0;
                    entry.size = size;
                    entry.file_mtime = mtime;
                    entry.got_date = 1;
                }
                pos
            }
            None => {
                let pos = self.len();
                self.reserve(pos + 1)?;
                self.set_len(pos + 1);
                let entry = &mut self.entries_mut()[pos];
                *entry = RlEntry::new_zeroed();
                entry.set_file_name(name);
                entry.size = size;
                entry.file_mtime = mtime;
                entry.got_date = 1;
                entry.in_list = 1;
                pos
            }
        };

        let entry = &self.entries()[pos];
        if entry.retrieved == 1 {
            return Ok(FetchDecision::Skip);
        }
        if let Some((sign, reference)) = opts.ignore_size {
            if ignore_size(sign, reference, size) {
                return Ok(FetchDecision::Skip);
            }
        }
        if let Some((sign, reference)) = opts.ignore_file_time {
            if ignore_mtime(sign, reference, now - mtime) {
                return Ok(FetchDecision::Skip);
            }
        }
        Ok(FetchDecision::Fetch)
    }

    /// Mark a file fully written locally and renamed into place.
    pub fn mark_retrieved(&mut self, name: &str) {
        if let Some(pos) = self.position_of(name) {
            let entry = &mut self.entries_mut()[pos];
            entry.retrieved = 1;
            entry.assigned = 0;
        }
    }

    /// End of a listing pass: drop entries the remote no longer has.
    pub fn compact(&mut self) -> Result<(), RlError> {
        let mut keep = 0usize;
        let count = self.len();
        {
            let entries = self.entries_mut();
            for i in 0..count {
                if entries[i].in_list == 1 {
                    if keep != i {
                        entries[keep] = entries[i];
                    }
                    keep += 1;
                }
            }
        }
        self.set_len(keep);
        self.shrink_to_fit()
    }

    /// Flush a mapped list; a transient list forgets everything.
    pub fn detach(self) -> Result<(), RlError> {
        if let Backing::Mapped { map, path, .. } = &self.backing {
            map.flush()
                .map_err(|source| RlError::Io { path: path.display().to_string(), source })?;
        }
        Ok(())
    }
}

/// Bring an existing on-disk list up to the current layout.
///
/// Unknown versions, or files whose size contradicts the layout their
/// version byte claims, are discarded and recreated empty.
fn convert_or_discard(path: &Path) -> Result<(), RlError> {
    let io_err = |source| RlError::Io { path: path.display().to_string(), source };
    let bytes = std::fs::read(path).map_err(io_err)?;
    if bytes.len() < AFD_WORD_OFFSET {
        return recreate_empty(path);
    }
    let header = match AreaHeader::read_from_bytes(&bytes[..AFD_WORD_OFFSET]) {
        Ok(h) => h,
        Err(_) => return recreate_empty(path),
    };
    let count = header.count.max(0) as usize;

    let entries: Vec<RlEntry> = match header.version {
        CURRENT_RL_VERSION => {
            if bytes.len() as u64 != expected_file_size(count) {
                return recreate_empty(path);
            }
            return Ok(());
        }
        LEGACY_ASCII_VERSION => {
            let stride = std::mem::size_of::<LegacyAsciiEntry>();
            if !legacy_size_ok(bytes.len(), count, stride) {
                return recreate_empty(path);
            }
            let end = AFD_WORD_OFFSET + count * stride;
            let old = <[LegacyAsciiEntry]>::ref_from_bytes(&bytes[AFD_WORD_OFFSET..end])
                .map_err(|_| RlError::BadLayout(path.display().to_string()))?;
            old.iter()
                .map(|o| {
                    let mut n = RlEntry::new_zeroed();
                    n.file_name = o.file_name;
                    n.size = o.size;
                    n.retrieved = o.retrieved;
                    n.in_list = o.in_list;
                    match parse_legacy_date(&o.date) {
                        Some(mtime) => {
                            n.file_mtime = mtime;
                            n.got_date = 1;
                        }
                        None => {
                            n.file_mtime = -1;
                            n.got_date = 0;
                        }
                    }
                    n
                })
                .collect()
        }
        LEGACY_INT_VERSION => {
            let stride = std::mem::size_of::<LegacyIntEntry>();
            if !legacy_size_ok(bytes.len(), count, stride) {
                return recreate_empty(path);
            }
            let end = AFD_WORD_OFFSET + count * stride;
            let old = <[LegacyIntEntry]>::ref_from_bytes(&bytes[AFD_WORD_OFFSET..end])
                .map_err(|_| RlError::BadLayout(path.display().to_string()))?;
            old.iter()
                .map(|o| {
                    let mut n = RlEntry::new_zeroed();
                    n.file_name = o.file_name;
                    n.size = i64::from(o.size);
                    n.retrieved = o.retrieved;
                    n.in_list = o.in_list;
                    match parse_legacy_date(&o.date) {
                        Some(mtime) => {
                            n.file_mtime = mtime;
                            n.got_date = 1;
                        }
                        None => {
                            n.file_mtime = -1;
                            n.got_date = 0;
                        }
                    }
                    n
                })
                .collect()
        }
        _ => {
            tracing::warn!(path = %path.display(), version = header.version,
                "retrieve list has unknown version, discarding");
            return recreate_empty(path);
        }
    };

    tracing::info!(path = %path.display(), from = header.version, count,
        "converting retrieve list to current layout");
    write_entries(path, &entries)
}

fn legacy_size_ok(len: usize, count: usize, stride: usize) -> bool {
    let chunks = count.div_ceil(RETRIEVE_LIST_STEP_SIZE).max(1);
    len == AFD_WORD_OFFSET + chunks * RETRIEVE_LIST_STEP_SIZE * stride
}

fn parse_legacy_date(date: &[u8; 16]) -> Option<i64> {
    if date[0] == 0 {
        return None;
    }
    let text = crate::records::fixed_str(date);
    let parsed = NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%S").ok()?;
    Some(parsed.and_utc().timestamp())
}

fn recreate_empty(path: &Path) -> Result<(), RlError> {
    tracing::warn!(path = %path.display(), "retrieve list unusable, recreating empty");
    write_image(path, &empty_image())
}

fn write_entries(path: &Path, entries: &[RlEntry]) -> Result<(), RlError> {
    let mut bytes = vec![0u8; expected_file_size(entries.len()) as usize];
    let header = AreaHeader::new(entries.len() as i32, CURRENT_RL_VERSION);
    bytes[..AFD_WORD_OFFSET].copy_from_slice(header.as_bytes());
    for (i, entry) in entries.iter().enumerate() {
        let start = AFD_WORD_OFFSET + i * STRIDE;
        bytes[start..start + STRIDE].copy_from_slice(entry.as_bytes());
    }
    write_image(path, &bytes)
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<(), RlError> {
    let io_err = |source| RlError::Io { path: path.display().to_string(), source };
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}

/// Build a legacy-layout file for tests and for producers that still
/// speak the old formats.
#[doc(hidden)]
pub fn write_legacy_ascii(
    path: &Path,
    rows: &[(&str, i64, &str, bool, bool)],
) -> Result<(), RlError> {
    let stride = std::mem::size_of::<LegacyAsciiEntry>();
    let chunks = rows.len().div_ceil(RETRIEVE_LIST_STEP_SIZE).max(1);
    let mut bytes = vec![0u8; AFD_WORD_OFFSET + chunks * RETRIEVE_LIST_STEP_SIZE * stride];
    let header = AreaHeader::new(rows.len() as i32, LEGACY_ASCII_VERSION);
    bytes[..AFD_WORD_OFFSET].copy_from_slice(header.as_bytes());
    for (i, (name, size, date, retrieved, in_list)) in rows.iter().enumerate() {
        let mut entry = LegacyAsciiEntry::new_zeroed();
        crate::records::set_fixed_str(&mut entry.file_name, name);
        crate::records::set_fixed_str(&mut entry.date, date);
        entry.size = *size;
        entry.retrieved = u8::from(*retrieved);
        entry.in_list = u8::from(*in_list);
        let start = AFD_WORD_OFFSET + i * stride;
        bytes[start..start + stride].copy_from_slice(entry.as_bytes());
    }
    write_image(path, &bytes)
}

#[cfg(test)]
#[path = "rl_tests.rs"]
mod tests;
