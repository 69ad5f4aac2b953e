// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use afd_core::ConnectStatus;
use zerocopy::FromZeros;

#[test]
fn fixed_str_round_trips_and_truncates() {
    let mut buf = [0u8; 9];
    set_fixed_str(&mut buf, "h1");
    assert_eq!(fixed_str(&buf), "h1");
    set_fixed_str(&mut buf, "much-too-long-alias");
    assert_eq!(fixed_str(&buf).len(), 8);
}

#[test]
fn zeroed_slot_is_a_free_disconnected_lane() {
    let slot = JobSlot::new_zeroed();
    assert_eq!(slot.pid, 0);
    assert_eq!(slot.connect_status(), ConnectStatus::Disconnect);
    assert_eq!(slot.burst_marker(), afd_core::SlotMarker::None);
    assert_eq!(slot.msg_name(), "");
}

#[test]
fn slot_reset_clears_everything() {
    let mut slot = JobSlot::new_zeroed();
    slot.pid = 1234;
    slot.job_id = 9;
    slot.bytes_send = 100;
    slot.set_msg_name("42/0/abc");
    slot.set_file_name_in_use("f.dat");
    slot.set_connect_status(ConnectStatus::Active);

    slot.reset(false);
    assert_eq!(slot.pid, 0);
    assert_eq!(slot.connect_status(), ConnectStatus::Disconnect);
    assert_eq!(slot.msg_name(), "");
    assert_eq!(slot.file_name_in_use(), "");
    assert_eq!(slot.bytes_send, 0);

    slot.pid = 55;
    slot.reset(true);
    assert_eq!(slot.connect_status(), ConnectStatus::NotWorking);
}

#[test]
fn host_free_slot_respects_allowed_transfers() {
    let mut host = HostRecord::new_zeroed();
    host.allowed_transfers = 2;
    assert_eq!(host.free_slot(), Some(0));
    host.job_status[0].pid = 100;
    assert_eq!(host.free_slot(), Some(1));
    host.job_status[1].pid = 101;
    // Slot 2 exists but is outside the allowed window.
    assert_eq!(host.free_slot(), None);
}

#[test]
fn error_history_is_a_ring() {
    let mut host = HostRecord::new_zeroed();
    for code in 1..=7u8 {
        host.push_error_history(code);
    }
    assert_eq!(host.error_history, [7, 6, 5, 4, 3]);
}

#[test]
fn host_toggle_selects_real_hostname() {
    let mut host = HostRecord::new_zeroed();
    host.set_real_hostname(0, "primary");
    host.set_real_hostname(1, "secondary");
    host.host_toggle = 1;
    assert_eq!(host.active_hostname(), "primary");
    host.host_toggle = 2;
    assert_eq!(host.active_hostname(), "secondary");
}

#[test]
fn msa_top_rate_roll_shifts_and_clears_today() {
    let mut row = MsaRecord::new_zeroed();
    row.top_tr = [10, 9, 8, 7, 6, 5, 4];
    row.top_fr = [1, 2, 3, 4, 5, 6, 7];
    row.top_no_of_transfers = [3, 0, 0, 0, 0, 0, 0];
    row.roll_top_rates();
    assert_eq!(row.top_tr, [0, 10, 9, 8, 7, 6, 5]);
    assert_eq!(row.top_fr, [0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(row.top_no_of_transfers, [0, 3, 0, 0, 0, 0, 0]);
}

#[test]
fn ahl_row_holds_alias_and_both_hostnames() {
    let mut row = AhlRecord::new_zeroed();
    row.set("h1", "one.example", "two.example");
    assert_eq!(row.host_alias(), "h1");
    assert_eq!(row.real_hostname(0), "one.example");
    assert_eq!(row.real_hostname(1), "two.example");
}
