// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed sizes shared by the status areas and the config parsers.
//!
//! These govern on-disk record layout; changing any of them is a
//! status-area version bump.

/// Maximum length of a host alias, excluding the NUL padding.
pub const MAX_HOST_ALIAS_LENGTH: usize = 8;

/// Maximum length of a remote-AFD alias in AFD_MON_CONFIG.
pub const MAX_AFD_ALIAS_LENGTH: usize = 12;

/// Maximum length of a fetch-directory alias.
pub const MAX_DIR_ALIAS_LENGTH: usize = 16;

/// Maximum length of a real hostname, including room for the NUL.
pub const MAX_REAL_HOSTNAME_LENGTH: usize = 40;

/// Maximum number of digits accepted for an integer config field.
pub const MAX_INT_LENGTH: usize = 11;

/// Concurrency lanes per host. Each lane holds at most one live worker.
pub const MAX_SLOTS: usize = 5;

/// Length of the per-host ring of recent worker exit reasons.
pub const ERROR_HISTORY_LENGTH: usize = 5;

/// Days of per-day top-rate history kept in a monitor row.
pub const STORAGE_TIME: usize = 7;

/// Entries in the monitor system-log activity ring.
pub const LOG_FIFO_SIZE: usize = 8;

/// Default AFDD port when AFD_MON_CONFIG omits one.
pub const DEFAULT_AFD_PORT: u16 = 4444;

/// Default probe poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL: u32 = 5;

/// Seconds a probe sleeps before reconnecting after an error.
pub const RETRY_INTERVAL: u64 = 60;
