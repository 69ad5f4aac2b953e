// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connect status, slot markers, and per-host status flags.
//!
//! All of these are stored as single bytes or words inside mapped status
//! records, so each enum carries an explicit wire value and a lossless
//! `from_byte` that maps unknown input to a safe default.

use serde::{Deserialize, Serialize};

/// Connection state of a job slot or monitor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ConnectStatus {
    /// Slot is free, no worker attached.
    #[default]
    Disconnect = 0,
    /// Worker (or probe) is establishing the connection.
    Connecting = 1,
    /// Transfer or probe session is active.
    Active = 2,
    /// Worker exited with a fault; slot awaits the reaper.
    NotWorking = 3,
    /// Probe lost its peer and is waiting to retry.
    Disconnected = 4,
    /// Row is administratively disabled until an explicit enable.
    Disabled = 5,
}

impl ConnectStatus {
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => ConnectStatus::Connecting,
            2 => ConnectStatus::Active,
            3 => ConnectStatus::NotWorking,
            4 => ConnectStatus::Disconnected,
            5 => ConnectStatus::Disabled,
            _ => ConnectStatus::Disconnect,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Burst rendezvous marker kept in a job slot.
///
/// A worker publishes `AwaitingJob` (or `IdleKeepAlive` while sitting out
/// its keep-connected window) before blocking on its slot fifo; the
/// supervisor answers over the fifo and may publish `Incompatible` to send
/// the worker away. The marker byte replaces the `unique_name[2]` codes
/// 4/5/6 of the old handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum SlotMarker {
    /// No rendezvous in progress.
    #[default]
    None = 0,
    /// Worker finished a job and is ready to take a compatible one.
    AwaitingJob = 4,
    /// Worker is idling through its keep-connected window.
    IdleKeepAlive = 5,
    /// Supervisor found a job the open connection cannot serve.
    Incompatible = 6,
}

impl SlotMarker {
    pub fn from_byte(b: u8) -> Self {
        match b {
            4 => SlotMarker::AwaitingJob,
            5 => SlotMarker::IdleKeepAlive,
            6 => SlotMarker::Incompatible,
            _ => SlotMarker::None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Bit flags stored in the host-status word of an FSA record.
pub mod host_status {
    /// Queue was auto-paused because the error counter crossed max_errors.
    pub const AUTO_PAUSE_QUEUE: u32 = 1 << 0;
    /// Operator paused the queue by hand.
    pub const PAUSE_QUEUE: u32 = 1 << 1;
    /// Host is administratively stopped; nothing may be dispatched.
    pub const STOP_TRANSFER: u32 = 1 << 2;
    /// Retrieving from this host is disabled.
    pub const RETRIEVE_DISABLED: u32 = 1 << 3;
    /// Create the remote target directory if it is missing.
    pub const CREATE_TARGET_DIR: u32 = 1 << 4;
    /// Order job files newest-last before sending.
    pub const SORT_FILE_NAMES: u32 = 1 << 5;
    /// Restore source mtime on fetched files.
    pub const KEEP_TIME_STAMP: u32 = 1 << 6;
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
