// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! afd-cli: the `mafd` control wrapper and the `mafdcmd` command tool.

pub mod control;
pub mod permissions;

pub use control::{check_alive, send_shutdown, start_afd_mon, ALIVE_TIMEOUT};
pub use permissions::{lookup_permissions, parse_permissions, PermissionSet, Token};
