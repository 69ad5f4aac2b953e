// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic mapped array of fixed-stride records behind an [`AreaHeader`].
//!
//! Writers regenerate an area by writing a complete new file next to the
//! old one, marking the old header STALE, and renaming the new file into
//! place. Every attached process polls its own mapping's header and
//! re-attaches when it sees the sentinel.

use crate::header::{AreaHeader, AFD_WORD_OFFSET, STALE};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[derive(Debug, Error)]
pub enum AreaError {
    #[error("area {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("area {0} is stale (regeneration in progress?)")]
    Stale(String),
    #[error("area {path} has version {found}, expected {expected}")]
    Version { path: String, found: u8, expected: u8 },
    #[error("area {path} is truncated: {len} bytes for {count} records")]
    Truncated { path: String, len: u64, count: i32 },
    #[error("record position {pos} out of range (count {count})")]
    OutOfRange { pos: usize, count: usize },
}

/// Result of a stale check.
#[derive(Debug, PartialEq, Eq)]
pub enum AreaCheck {
    /// The mapping is still current.
    Unchanged,
    /// The area was rebuilt; the record of interest lives at the new
    /// position.
    ReattachedAndFound(usize),
    /// The area was rebuilt and no longer holds the record of interest.
    ReattachedButGone,
}

/// A memory-mapped array of `R` records.
#[derive(Debug)]
pub struct MappedArea<R> {
    file: File,
    map: MmapMut,
    path: PathBuf,
    version: u8,
    _marker: PhantomData<R>,
}

impl<R> MappedArea<R>
where
    R: FromBytes + IntoBytes + KnownLayout + Immutable,
{
    fn stride() -> usize {
        std::mem::size_of::<R>()
    }

    fn io_err(path: &Path) -> impl Fn(std::io::Error) -> AreaError + '_ {
        move |source| AreaError::Io { path: path.display().to_string(), source }
    }

    /// Write a brand-new area file (tmp + rename) and attach to it.
    ///
    /// An existing file at `path` is marked STALE first so attached
    /// processes notice the swap.
    pub fn create(path: &Path, version: u8, records: &[R]) -> Result<Self, AreaError> {
        let err = Self::io_err(path);
        if path.exists() {
            if let Ok(mut old) = Self::attach_any_version(path) {
                old.mark_stale();
            }
        }

        let header = AreaHeader::new(records.len() as i32, version);
        let mut bytes = Vec::with_capacity(AFD_WORD_OFFSET + records.len() * Self::stride());
        bytes.extend_from_slice(header.as_bytes());
        for record in records {
            bytes.extend_from_slice(record.as_bytes());
        }

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &bytes).map_err(&err)?;
        std::fs::rename(&tmp, path).map_err(&err)?;
        Self::attach(path, version)
    }

    /// Map an existing area file, validating version and size.
    pub fn attach(path: &Path, expected_version: u8) -> Result<Self, AreaError> {
        let area = Self::attach_any_version(path)?;
        let header = area.header();
        if header.is_stale() {
            return Err(AreaError::Stale(path.display().to_string()));
        }
        if header.version != expected_version {
            return Err(AreaError::Version {
                path: path.display().to_string(),
                found: header.version,
                expected: expected_version,
            });
        }
        Ok(area)
    }

    fn attach_any_version(path: &Path) -> Result<Self, AreaError> {
        let err = Self::io_err(path);
        let file = OpenOptions::new().read(true).write(true).open(path).map_err(&err)?;
        let len = file.metadata().map_err(&err)?.len();
        if (len as usize) < AFD_WORD_OFFSET {
            return Err(AreaError::Truncated {
                path: path.display().to_string(),
                len,
                count: 0,
            });
        }
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(&err)?;
        let header = AreaHeader::read_from_bytes(&map[..AFD_WORD_OFFSET])
            .unwrap_or(AreaHeader { count: STALE, flags: [0; 3], version: 0 });
        if !header.is_stale() {
            let needed = AFD_WORD_OFFSET + header.count.max(0) as usize * Self::stride();
            if (len as usize) < needed {
                return Err(AreaError::Truncated {
                    path: path.display().to_string(),
                    len,
                    count: header.count,
                });
            }
        }
        let version = header.version;
        Ok(Self { file, map, path: path.to_path_buf(), version, _marker: PhantomData })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn header(&self) -> AreaHeader {
        AreaHeader::read_from_bytes(&self.map[..AFD_WORD_OFFSET])
            .unwrap_or(AreaHeader { count: STALE, flags: [0; 3], version: self.version })
    }

    pub fn count(&self) -> usize {
        self.header().count.max(0) as usize
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn is_stale(&self) -> bool {
        self.header().is_stale()
    }

    /// Stamp the STALE sentinel into this mapping's header.
    pub fn mark_stale(&mut self) {
        if let Ok(header) = AreaHeader::mut_from_bytes(&mut self.map[..AFD_WORD_OFFSET]) {
            header.count = STALE;
        }
        let _ = self.map.flush();
    }

    fn range(&self, pos: usize) -> Result<std::ops::Range<usize>, AreaError> {
        let count = self.count();
        if pos >= count {
            return Err(AreaError::OutOfRange { pos, count });
        }
        let start = AFD_WORD_OFFSET + pos * Self::stride();
        Ok(start..start + Self::stride())
    }

    pub fn record(&self, pos: usize) -> Result<&R, AreaError> {
        let range = self.range(pos)?;
        R::ref_from_bytes(&self.map[range]).map_err(|_| AreaError::OutOfRange {
            pos,
            count: self.count(),
        })
    }

    pub fn record_mut(&mut self, pos: usize) -> Result<&mut R, AreaError> {
        let range = self.range(pos)?;
        let count = self.count();
        R::mut_from_bytes(&mut self.map[range])
            .map_err(|_| AreaError::OutOfRange { pos, count })
    }

    /// Iterate record positions.
    pub fn positions(&self) -> std::ops::Range<usize> {
        0..self.count()
    }

    /// Grow or shrink the file to hold exactly `new_count` records.
    pub fn resize(&mut self, new_count: usize) -> Result<(), AreaError> {
        let err = |source| AreaError::Io { path: self.path.display().to_string(), source };
        let new_len = (AFD_WORD_OFFSET + new_count * Self::stride()) as u64;
        self.map.flush().map_err(err)?;
        self.file.set_len(new_len).map_err(err)?;
        self.map = unsafe { MmapMut::map_mut(&self.file) }.map_err(err)?;
        if let Ok(header) = AreaHeader::mut_from_bytes(&mut self.map[..AFD_WORD_OFFSET]) {
            header.count = new_count as i32;
        }
        Ok(())
    }

    /// Observe the stale sentinel and re-attach when it fires.
    ///
    /// `locate` maps the freshly attached area to the new position of
    /// whatever record the caller was holding on to.
    pub fn check(
        &mut self,
        locate: impl Fn(&Self) -> Option<usize>,
    ) -> Result<AreaCheck, AreaError> {
        if !self.is_stale() {
            return Ok(AreaCheck::Unchanged);
        }
        let fresh = Self::attach_any_version(&self.path)?;
        if fresh.is_stale() {
            return Err(AreaError::Stale(self.path.display().to_string()));
        }
        *self = fresh;
        match locate(self) {
            Some(pos) => Ok(AreaCheck::ReattachedAndFound(pos)),
            None => Ok(AreaCheck::ReattachedButGone),
        }
    }

    /// Flush dirty pages and drop the mapping.
    pub fn detach(self) -> Result<(), AreaError> {
        self.map
            .flush()
            .map_err(|source| AreaError::Io { path: self.path.display().to_string(), source })
    }
}

#[cfg(test)]
#[path = "area_tests.rs"]
mod tests;
