// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! afd-core: domain types shared by every AFD process.
//!
//! Everything here is process-agnostic: aliases and their length limits,
//! connect status and exit codes, the filter/rename/duplicate-check pure
//! functions applied by transfer workers, and the work-dir layout.

pub mod alias;
pub mod clock;
pub mod dest;
pub mod dupcheck;
pub mod exit;
pub mod filters;
pub mod limits;
pub mod msg;
pub mod rename;
pub mod status;
pub mod workdir;

pub use alias::{AfdAlias, DirAlias, HostAlias};
pub use clock::{Clock, FakeClock, SystemClock};
pub use dest::{Destination, DestinationError, Scheme};
pub use dupcheck::{DupAction, DupCheck, DupCheckError, DupVerdict};
pub use exit::TransferExit;
pub use filters::{age_limit_expired, ignore_mtime, ignore_size, TriSign};
pub use limits::{
    ERROR_HISTORY_LENGTH, MAX_AFD_ALIAS_LENGTH, MAX_DIR_ALIAS_LENGTH, MAX_HOST_ALIAS_LENGTH,
    MAX_INT_LENGTH, MAX_REAL_HOSTNAME_LENGTH, MAX_SLOTS, STORAGE_TIME,
};
pub use msg::{JobMessage, LockStyle, MsgError};
pub use rename::{RenameRule, RenameRuleError};
pub use status::{host_status, ConnectStatus, SlotMarker};
pub use workdir::{WorkDir, WorkDirError};
