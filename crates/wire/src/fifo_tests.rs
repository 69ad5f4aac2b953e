// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn bare_opcodes_decode_one_to_one() {
    let mut dec = FifoDecoder::new();
    let mut bytes = FifoCommand::Shutdown.encode();
    bytes.extend(FifoCommand::IsAlive.encode());
    bytes.extend(FifoCommand::Ackn.encode());
    assert_eq!(
        dec.feed(&bytes),
        vec![FifoCommand::Shutdown, FifoCommand::IsAlive, FifoCommand::Ackn]
    );
    assert_eq!(dec.pending(), 0);
}

#[test]
fn argument_commands_round_trip() {
    let mut dec = FifoDecoder::new();
    for cmd in [
        FifoCommand::DisableMon(3),
        FifoCommand::EnableMon(12),
        FifoCommand::RetryHost("h1".into()),
        FifoCommand::EnableHost("h2".into()),
        FifoCommand::DisableHost("h3".into()),
    ] {
        assert_eq!(dec.feed(&cmd.encode()), vec![cmd]);
    }
}

#[test]
fn partial_argument_frame_is_carried_across_reads() {
    let mut dec = FifoDecoder::new();
    let bytes = FifoCommand::EnableMon(42).encode();
    let (a, b) = bytes.split_at(3);
    assert!(dec.feed(a).is_empty());
    assert!(dec.pending() > 0);
    assert_eq!(dec.feed(b), vec![FifoCommand::EnableMon(42)]);
    assert_eq!(dec.pending(), 0);
}

#[test]
fn garbage_bytes_are_skipped_without_losing_following_commands() {
    let mut dec = FifoDecoder::new();
    let mut bytes = vec![0xEE, 0xFF];
    bytes.extend(FifoCommand::Shutdown.encode());
    assert_eq!(dec.feed(&bytes), vec![FifoCommand::Shutdown]);
}

#[test]
fn non_numeric_position_is_dropped() {
    let mut dec = FifoDecoder::new();
    let bytes = [4u8, b' ', b'x', b'y', 0];
    assert!(dec.feed(&bytes).is_empty());
    assert_eq!(dec.pending(), 0);
}

#[test]
fn malformed_argument_frame_resynchronizes() {
    let mut dec = FifoDecoder::new();
    // Opcode with no space separator before the NUL.
    let mut bytes = vec![5u8, b'9', 0];
    bytes.extend(FifoCommand::IsAlive.encode());
    let cmds = dec.feed(&bytes);
    assert_eq!(cmds, vec![FifoCommand::IsAlive]);
}
