// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-layout records stored inside the mapped areas.
//!
//! Layout rules: `repr(C)`, widest fields first, explicit padding so the
//! zerocopy derives hold, total size a multiple of 8. Strings live in
//! NUL-padded byte arrays; the accessor pair `*_str`/`set_*` hides that.

use afd_core::{ConnectStatus, SlotMarker, ERROR_HISTORY_LENGTH, MAX_SLOTS, STORAGE_TIME};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Read a NUL-padded fixed byte array back into a str.
pub(crate) fn fixed_str(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}

/// Write a str into a NUL-padded fixed byte array, truncating.
pub(crate) fn set_fixed_str(target: &mut [u8], value: &str) {
    target.fill(0);
    let take = value.len().min(target.len().saturating_sub(1));
    target[..take].copy_from_slice(&value.as_bytes()[..take]);
}

/// One concurrency lane of a host: at most one live worker.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct JobSlot {
    pub file_size: u64,
    pub file_size_done: u64,
    pub bytes_send: u64,
    pub file_size_in_use: u64,
    pub file_size_in_use_done: u64,
    pub pid: i32,
    pub job_id: u32,
    pub no_of_files: u32,
    pub no_of_files_done: u32,
    connect_status: u8,
    burst_marker: u8,
    msg_name: [u8; 64],
    file_name_in_use: [u8; 102],
}

impl JobSlot {
    pub fn connect_status(&self) -> ConnectStatus {
        ConnectStatus::from_byte(self.connect_status)
    }

    pub fn set_connect_status(&mut self, status: ConnectStatus) {
        self.connect_status = status.as_byte();
    }

    pub fn burst_marker(&self) -> SlotMarker {
        SlotMarker::from_byte(self.burst_marker)
    }

    pub fn set_burst_marker(&mut self, marker: SlotMarker) {
        self.burst_marker = marker.as_byte();
    }

    pub fn msg_name(&self) -> &str {
        fixed_str(&self.msg_name)
    }

    pub fn set_msg_name(&mut self, name: &str) {
        set_fixed_str(&mut self.msg_name, name);
    }

    pub fn file_name_in_use(&self) -> &str {
        fixed_str(&self.file_name_in_use)
    }

    pub fn set_file_name_in_use(&mut self, name: &str) {
        set_fixed_str(&mut self.file_name_in_use, name);
    }

    /// Reset the lane after a worker is gone.
    ///
    /// `faulty` leaves the NOT_WORKING mark for the scheduler; a clean
    /// exit returns the lane to DISCONNECT.
    pub fn reset(&mut self, faulty: bool) {
        self.set_connect_status(if faulty {
            ConnectStatus::NotWorking
        } else {
            ConnectStatus::Disconnect
        });
        self.pid = 0;
        self.job_id = 0;
        self.no_of_files = 0;
        self.no_of_files_done = 0;
        self.file_size = 0;
        self.file_size_done = 0;
        self.file_size_in_use = 0;
        self.file_size_in_use_done = 0;
        self.burst_marker = SlotMarker::None.as_byte();
        self.msg_name.fill(0);
        self.file_name_in_use.fill(0);
    }
}

/// Per-host status record in the FSA.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct HostRecord {
    pub total_file_size: u64,
    pub bytes_send: u64,
    /// Whole-host rate limit in bytes per second. 0 means unlimited.
    pub transfer_rate_limit: u64,
    /// The per-process share of the rate limit, recomputed on demand.
    pub trl_per_process: u64,
    pub dup_check_timeout: i64,
    pub transfer_timeout: i64,
    pub last_connection: i64,
    pub allowed_transfers: u32,
    pub active_transfers: u32,
    pub total_file_counter: u32,
    pub file_counter_done: u32,
    pub error_counter: u32,
    pub max_errors: u32,
    pub jobs_queued: u32,
    pub connections: u32,
    pub keep_connected: u32,
    pub host_status: u32,
    pub protocol: u32,
    pub protocol_options: u32,
    pub dup_check_flag: u32,
    /// 1 or 2, selecting the active real hostname.
    pub host_toggle: u8,
    pub error_history: [u8; ERROR_HISTORY_LENGTH],
    host_alias: [u8; 9],
    _pad: [u8; 5],
    real_hostname: [[u8; 40]; 2],
    pub job_status: [JobSlot; MAX_SLOTS],
}

impl HostRecord {
    pub fn host_alias(&self) -> &str {
        fixed_str(&self.host_alias)
    }

    pub fn set_host_alias(&mut self, alias: &str) {
        set_fixed_str(&mut self.host_alias, alias);
    }

    pub fn real_hostname(&self, which: usize) -> &str {
        fixed_str(&self.real_hostname[which.min(1)])
    }

    pub fn set_real_hostname(&mut self, which: usize, name: &str) {
        set_fixed_str(&mut self.real_hostname[which.min(1)], name);
    }

    /// The real hostname selected by the toggle.
    pub fn active_hostname(&self) -> &str {
        let idx = if self.host_toggle == 2 { 1 } else { 0 };
        self.real_hostname(idx)
    }

    /// Push a worker exit reason onto the error-history ring.
    pub fn push_error_history(&mut self, code: u8) {
        self.error_history.rotate_right(1);
        self.error_history[0] = code;
    }

    /// Lane index of the first free slot within allowed_transfers.
    pub fn free_slot(&self) -> Option<usize> {
        let limit = (self.allowed_transfers as usize).min(MAX_SLOTS);
        self.job_status[..limit].iter().position(|s| s.pid == 0)
    }
}

/// Per-fetch-directory record in the FRA.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct DirRecord {
    pub ignore_size: i64,
    pub ignore_file_time: i64,
    pub next_check_time: i64,
    pub bytes_received: u64,
    pub dir_flag: u32,
    pub poll_interval: u32,
    pub keep_connected: u32,
    pub error_counter: u32,
    pub files_received: u32,
    pub fsa_pos: i32,
    pub gt_lt_sign_size: u8,
    pub gt_lt_sign_time: u8,
    pub stupid_mode: u8,
    /// Delete the remote file after a successful fetch.
    pub remove: u8,
    /// A retrieve job for this dir is queued or running.
    pub queued: u8,
    dir_alias: [u8; 17],
    _pad: [u8; 2],
    url: [u8; 256],
}

impl DirRecord {
    pub fn dir_alias(&self) -> &str {
        fixed_str(&self.dir_alias)
    }

    pub fn set_dir_alias(&mut self, alias: &str) {
        set_fixed_str(&mut self.dir_alias, alias);
    }

    pub fn url(&self) -> &str {
        fixed_str(&self.url)
    }

    pub fn set_url(&mut self, url: &str) {
        set_fixed_str(&mut self.url, url);
    }
}

/// Dir-flag bit: retrieving for this directory is disabled.
pub const DIR_DISABLED: u32 = 1 << 0;

/// One monitored remote AFD in the MSA.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct MsaRecord {
    pub last_data_time: i64,
    pub top_tr: [u64; STORAGE_TIME],
    pub tr: u64,
    pub fs: u64,
    pub fc: u32,
    pub fr: u32,
    pub top_fr: [u32; STORAGE_TIME],
    pub ec: u32,
    pub sys_log_ec: u32,
    pub jobs_in_queue: i32,
    pub no_of_transfers: i32,
    pub top_no_of_transfers: [i32; STORAGE_TIME],
    pub max_connections: i32,
    pub host_error_counter: i32,
    pub no_of_hosts: i32,
    pub port: i32,
    pub poll_interval: i32,
    pub amg: u8,
    pub fd: u8,
    pub archive_watch: u8,
    connect_status: u8,
    pub sys_log_fifo: [u8; afd_core::limits::LOG_FIFO_SIZE],
    afd_alias: [u8; 13],
    _pad: [u8; 3],
    hostname: [u8; 40],
    afd_version: [u8; 40],
    r_work_dir: [u8; 128],
    convert_username: [[u8; 32]; 2],
}

impl MsaRecord {
    pub fn connect_status(&self) -> ConnectStatus {
        ConnectStatus::from_byte(self.connect_status)
    }

    pub fn set_connect_status(&mut self, status: ConnectStatus) {
        self.connect_status = status.as_byte();
    }

    pub fn afd_alias(&self) -> &str {
        fixed_str(&self.afd_alias)
    }

    pub fn set_afd_alias(&mut self, alias: &str) {
        set_fixed_str(&mut self.afd_alias, alias);
    }

    pub fn hostname(&self) -> &str {
        fixed_str(&self.hostname)
    }

    pub fn set_hostname(&mut self, name: &str) {
        set_fixed_str(&mut self.hostname, name);
    }

    pub fn afd_version(&self) -> &str {
        fixed_str(&self.afd_version)
    }

    pub fn set_afd_version(&mut self, v: &str) {
        set_fixed_str(&mut self.afd_version, v);
    }

    pub fn r_work_dir(&self) -> &str {
        fixed_str(&self.r_work_dir)
    }

    pub fn set_r_work_dir(&mut self, dir: &str) {
        set_fixed_str(&mut self.r_work_dir, dir);
    }

    pub fn convert_username(&self, which: usize) -> &str {
        fixed_str(&self.convert_username[which.min(1)])
    }

    pub fn set_convert_username(&mut self, which: usize, name: &str) {
        set_fixed_str(&mut self.convert_username[which.min(1)], name);
    }

    /// Shift the per-day top-rate rings one day and clear today.
    pub fn roll_top_rates(&mut self) {
        self.top_tr.rotate_right(1);
        self.top_fr.rotate_right(1);
        self.top_no_of_transfers.rotate_right(1);
        self.top_tr[0] = 0;
        self.top_fr[0] = 0;
        self.top_no_of_transfers[0] = 0;
    }
}

/// Row of the per-probe host list file (AHL).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct AhlRecord {
    host_alias: [u8; 9],
    _pad: [u8; 7],
    real_hostname: [[u8; 40]; 2],
}

impl AhlRecord {
    pub fn host_alias(&self) -> &str {
        fixed_str(&self.host_alias)
    }

    pub fn real_hostname(&self, which: usize) -> &str {
        fixed_str(&self.real_hostname[which.min(1)])
    }

    pub fn set(&mut self, alias: &str, real1: &str, real2: &str) {
        set_fixed_str(&mut self.host_alias, alias);
        set_fixed_str(&mut self.real_hostname[0], real1);
        set_fixed_str(&mut self.real_hostname[1], real2);
    }
}

const _: () = {
    assert!(std::mem::size_of::<JobSlot>() == 224);
    assert!(std::mem::size_of::<HostRecord>() == 208 + MAX_SLOTS * 224);
    assert!(std::mem::size_of::<DirRecord>() == 336);
    assert!(std::mem::size_of::<MsaRecord>() == 480);
    assert!(std::mem::size_of::<AhlRecord>() == 96);
};

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
