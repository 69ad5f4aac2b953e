// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    disconnect = { 0, ConnectStatus::Disconnect },
    connecting = { 1, ConnectStatus::Connecting },
    active = { 2, ConnectStatus::Active },
    not_working = { 3, ConnectStatus::NotWorking },
    disconnected = { 4, ConnectStatus::Disconnected },
    disabled = { 5, ConnectStatus::Disabled },
)]
fn connect_status_round_trips(byte: u8, status: ConnectStatus) {
    assert_eq!(ConnectStatus::from_byte(byte), status);
    assert_eq!(status.as_byte(), byte);
}

#[test]
fn unknown_connect_status_byte_is_disconnect() {
    assert_eq!(ConnectStatus::from_byte(99), ConnectStatus::Disconnect);
}

#[parameterized(
    none = { 0, SlotMarker::None },
    awaiting = { 4, SlotMarker::AwaitingJob },
    idle = { 5, SlotMarker::IdleKeepAlive },
    incompatible = { 6, SlotMarker::Incompatible },
)]
fn slot_marker_round_trips(byte: u8, marker: SlotMarker) {
    assert_eq!(SlotMarker::from_byte(byte), marker);
    assert_eq!(marker.as_byte(), byte);
}

#[test]
fn stray_marker_bytes_decode_to_none() {
    for b in [1u8, 2, 3, 7, 255] {
        assert_eq!(SlotMarker::from_byte(b), SlotMarker::None);
    }
}
