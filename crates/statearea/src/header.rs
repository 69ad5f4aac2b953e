// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The 8-byte header every mapped area file starts with.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Byte offset of the first record in every area file.
pub const AFD_WORD_OFFSET: usize = 8;

/// Count sentinel marking a rebuilt area. Attached processes observing
/// it must detach and re-attach to pick up the replacement file.
pub const STALE: i32 = -1;

pub const CURRENT_FSA_VERSION: u8 = 3;
pub const CURRENT_FRA_VERSION: u8 = 2;
pub const CURRENT_MSA_VERSION: u8 = 2;

/// Area file header: record count, feature-flag bytes, version.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct AreaHeader {
    pub count: i32,
    pub flags: [u8; 3],
    pub version: u8,
}

impl AreaHeader {
    pub fn new(count: i32, version: u8) -> Self {
        Self { count, flags: [0; 3], version }
    }

    pub fn is_stale(&self) -> bool {
        self.count == STALE
    }
}

const _: () = assert!(std::mem::size_of::<AreaHeader>() == AFD_WORD_OFFSET);
