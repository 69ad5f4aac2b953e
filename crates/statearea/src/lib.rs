// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! afd-statearea: the memory-mapped status areas and the retrieve list.
//!
//! Each area is a file of fixed-stride records behind an 8-byte header
//! (`AFD_WORD_OFFSET`) carrying the record count, a version byte, and a
//! stale sentinel. Supervisors, workers, and read-only tools all attach
//! to the same files; cross-process serialization of the hot counters
//! uses byte-range locks, everything else tolerates unlocked reads at
//! word granularity.

pub mod area;
pub mod fra;
pub mod fsa;
pub mod header;
pub mod locks;
pub mod msa;
pub mod records;
pub mod rl;

pub use area::{AreaCheck, AreaError, MappedArea};
pub use fra::{DirConfig, Fra};
pub use fsa::{Fsa, FsaError, FsaSingle, HostConfig};
pub use header::{AreaHeader, AFD_WORD_OFFSET, CURRENT_FSA_VERSION, CURRENT_MSA_VERSION, STALE};
pub use locks::{LockDomain, RangeLock};
pub use msa::{AhlFile, MonConfigRow, Msa};
pub use records::{AhlRecord, DirRecord, HostRecord, JobSlot, MsaRecord, DIR_DISABLED};
pub use rl::{
    FetchDecision, ListOptions, RetrieveList, RlError, StupidMode, CURRENT_RL_VERSION,
    RETRIEVE_LIST_STEP_SIZE,
};
