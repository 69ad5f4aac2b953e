// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer-worker exit codes.
//!
//! Workers never escalate recoverable errors across processes; they exit
//! with one of these codes and the FD supervisor decides whether to retry
//! or to escalate through the host error counter.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TransferExit {
    Success = 0,
    ConnectError = 10,
    AuthError = 11,
    TypeError = 12,
    ChdirError = 13,
    OpenRemoteError = 14,
    WriteRemoteError = 15,
    CloseRemoteError = 16,
    OpenLocalError = 17,
    ReadLocalError = 18,
    WriteLocalError = 19,
    MoveError = 20,
    RenameError = 21,
    RemoveLockfileError = 22,
    StillFilesToSend = 23,
    GotKilled = 24,
    IsFaulty = 25,
    AllocError = 26,
    Timeout = 27,
}

impl TransferExit {
    /// Map a raw process exit code back to the enum.
    ///
    /// Unknown codes fold into `IsFaulty` so the reaper always has an
    /// error-history byte to record.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => TransferExit::Success,
            10 => TransferExit::ConnectError,
            11 => TransferExit::AuthError,
            12 => TransferExit::TypeError,
            13 => TransferExit::ChdirError,
            14 => TransferExit::OpenRemoteError,
            15 => TransferExit::WriteRemoteError,
            16 => TransferExit::CloseRemoteError,
            17 => TransferExit::OpenLocalError,
            18 => TransferExit::ReadLocalError,
            19 => TransferExit::WriteLocalError,
            20 => TransferExit::MoveError,
            21 => TransferExit::RenameError,
            22 => TransferExit::RemoveLockfileError,
            23 => TransferExit::StillFilesToSend,
            24 => TransferExit::GotKilled,
            26 => TransferExit::AllocError,
            27 => TransferExit::Timeout,
            _ => TransferExit::IsFaulty,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// True when the reaper must count this exit against the host.
    pub fn counts_as_error(self) -> bool {
        !matches!(self, TransferExit::Success | TransferExit::GotKilled)
    }
}

impl fmt::Display for TransferExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferExit::Success => "success",
            TransferExit::ConnectError => "connect error",
            TransferExit::AuthError => "authentication error",
            TransferExit::TypeError => "type error",
            TransferExit::ChdirError => "chdir error",
            TransferExit::OpenRemoteError => "open remote error",
            TransferExit::WriteRemoteError => "write remote error",
            TransferExit::CloseRemoteError => "close remote error",
            TransferExit::OpenLocalError => "open local error",
            TransferExit::ReadLocalError => "read local error",
            TransferExit::WriteLocalError => "write local error",
            TransferExit::MoveError => "move error",
            TransferExit::RenameError => "rename error",
            TransferExit::RemoveLockfileError => "remove lockfile error",
            TransferExit::StillFilesToSend => "still files to send",
            TransferExit::GotKilled => "got killed",
            TransferExit::IsFaulty => "faulty",
            TransferExit::AllocError => "allocation error",
            TransferExit::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "exit_tests.rs"]
mod tests;
