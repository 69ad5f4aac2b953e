// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn frames_round_trip_in_order() {
    let mut dec = I32FrameDecoder::new();
    let mut bytes = Vec::new();
    for pid in [1234, -1234, 0, i32::MAX] {
        bytes.extend(encode_i32_frame(pid));
    }
    assert_eq!(dec.feed(&bytes), vec![1234, -1234, 0, i32::MAX]);
}

#[test]
fn split_frame_is_reassembled() {
    let mut dec = I32FrameDecoder::new();
    let bytes = encode_i32_frame(987654);
    assert!(dec.feed(&bytes[..3]).is_empty());
    assert_eq!(dec.pending(), 3);
    assert_eq!(dec.feed(&bytes[3..]), vec![987654]);
    assert_eq!(dec.pending(), 0);
}

#[test]
fn torn_reads_across_many_frames() {
    let mut dec = I32FrameDecoder::new();
    let mut bytes = Vec::new();
    for pid in 0..100 {
        bytes.extend(encode_i32_frame(pid));
    }
    let mut got = Vec::new();
    for chunk in bytes.chunks(7) {
        got.extend(dec.feed(chunk));
    }
    assert_eq!(got, (0..100).collect::<Vec<_>>());
}
