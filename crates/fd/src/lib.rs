// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! afd-fd: the FD supervisor and the transfer workers.
//!
//! The supervisor owns the job queue, forks one `sf_*`/`gf_*` process
//! per (host, slot), reaps them, and enforces the per-host limits. The
//! worker half of this crate is blocking code executed by the `sf_loc`
//! and `gf_loc` binaries.

pub mod burst;
pub mod delete;
pub mod dispatch;
pub mod fifos;
pub mod queue;
pub mod reap;
pub mod supervisor;
pub mod worker;

pub use burst::{BurstAnswer, BurstDecoder, burst_deadline, MIN_BURST_WAIT};
pub use delete::apply_delete;
pub use dispatch::{dispatch_tick, DispatchAction};
pub use fifos::FdFifos;
pub use queue::{Queue, QueueEntry, QueueError, PENDING};
pub use reap::handle_worker_exit;
pub use supervisor::{Supervisor, SupervisorError};
