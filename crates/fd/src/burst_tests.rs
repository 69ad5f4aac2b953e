// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_answer_round_trips() {
    let mut dec = BurstDecoder::new();
    let answer = BurstAnswer::Job("42/0/16123_ab_0".into());
    assert_eq!(dec.feed(&answer.encode()), Some(answer));
}

#[test]
fn incompatible_is_a_single_byte() {
    let mut dec = BurstDecoder::new();
    let bytes = BurstAnswer::Incompatible.encode();
    assert_eq!(bytes.len(), 1);
    assert_eq!(dec.feed(&bytes), Some(BurstAnswer::Incompatible));
}

#[test]
fn split_job_frame_waits_for_terminator() {
    let mut dec = BurstDecoder::new();
    let bytes = BurstAnswer::Job("7/0/m".into()).encode();
    assert_eq!(dec.feed(&bytes[..3]), None);
    assert_eq!(dec.feed(&bytes[3..]), Some(BurstAnswer::Job("7/0/m".into())));
}

#[test]
fn garbage_byte_is_dropped() {
    let mut dec = BurstDecoder::new();
    assert_eq!(dec.feed(&[0xEE]), None);
    assert_eq!(dec.feed(&BurstAnswer::Incompatible.encode()), Some(BurstAnswer::Incompatible));
}

#[test]
fn deadline_uses_keep_connected_bounded_by_timeout_margin() {
    // keep_connected below the margin wins.
    assert_eq!(burst_deadline(30, 120), Duration::from_secs(30));
    // Margin (timeout - 5) caps a large keep_connected.
    assert_eq!(burst_deadline(600, 120), Duration::from_secs(115));
    // keep_connected 0 (pure queue wait) uses the margin.
    assert_eq!(burst_deadline(0, 120), Duration::from_secs(115));
}

#[test]
fn deadline_never_reaches_zero() {
    assert_eq!(burst_deadline(0, 0), MIN_BURST_WAIT);
    assert_eq!(burst_deadline(1, 3), MIN_BURST_WAIT);
    assert!(burst_deadline(0, 6) >= MIN_BURST_WAIT);
}
