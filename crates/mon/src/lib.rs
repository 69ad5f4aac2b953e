// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! afd-mon: the fleet monitor.
//!
//! `afd_mon` keeps one `mon` probe per remote AFD alive, rebuilding the
//! MSA when AFD_MON_CONFIG changes; each probe speaks the AFDD status
//! protocol over TCP and writes one MSA row.

pub mod active;
pub mod config;
pub mod probe;
pub mod process;
pub mod supervisor;

pub use active::{read_active_file, write_active_file, ActiveFile};
pub use config::{eval_afd_mon_config, ConfigError};
pub use probe::{apply_frame, run_probe, ProbeEvent};
pub use process::{after_restart, may_restart, ProcessEntry, MAX_RESTARTS, RESTART_DECAY_SECS};
pub use supervisor::{MonSupervisor, MonSupervisorError};
