// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn interval_summary_parses_all_eight_fields() {
    let frame = parse_frame("IS 12 34567 890 7 2 1 3 44");
    assert_eq!(
        frame,
        AfddFrame::IntervalSummary {
            fc: 12,
            fs: 34567,
            tr: 890,
            fr: 7,
            ec: 2,
            host_error_counter: 1,
            no_of_transfers: 3,
            jobs_in_queue: 44,
        }
    );
}

#[test]
fn continuation_prefix_is_stripped() {
    assert_eq!(parse_frame("211-AM 1"), AfddFrame::AmgStatus(1));
    assert_eq!(parse_frame("211-FD 2"), AfddFrame::FdStatus(2));
    assert_eq!(parse_frame("211-AW 0"), AfddFrame::ArchiveWatchStatus(0));
}

#[test]
fn short_host_list_row_blanks_trailing_hostnames() {
    let frame = parse_frame("HL 2 h1");
    assert_eq!(
        frame,
        AfddFrame::HostList { pos: 2, alias: "h1".into(), real1: String::new(), real2: String::new() }
    );
    let full = parse_frame("HL 0 h1 one.example two.example");
    assert_eq!(
        full,
        AfddFrame::HostList {
            pos: 0,
            alias: "h1".into(),
            real1: "one.example".into(),
            real2: "two.example".into(),
        }
    );
}

#[test]
fn sys_log_radar_fills_the_ring() {
    let frame = parse_frame("SR 99 1 2 3 4 5 6 7 8");
    assert_eq!(frame, AfddFrame::SysLogRadar { counter: 99, fifo: [1, 2, 3, 4, 5, 6, 7, 8] });
    // Short rows zero-fill.
    let frame = parse_frame("SR 5 9");
    assert_eq!(frame, AfddFrame::SysLogRadar { counter: 5, fifo: [9, 0, 0, 0, 0, 0, 0, 0] });
}

#[test]
fn version_and_workdir_keep_spaces() {
    assert_eq!(parse_frame("AV 1.4.7 pre"), AfddFrame::Version("1.4.7 pre".into()));
    assert_eq!(parse_frame("WD /var/afd"), AfddFrame::WorkDir("/var/afd".into()));
}

#[test]
fn terminal_reply_and_shutdown_lines() {
    assert_eq!(parse_frame("211 End of status"), AfddFrame::ReplyCode(211));
    assert_eq!(parse_frame("220 afdd ready"), AfddFrame::ReplyCode(220));
    assert_eq!(parse_frame(AFDD_SHUTDOWN_MESSAGE), AfddFrame::Shutdown);
}

#[test]
fn junk_lines_surface_as_unknown() {
    assert!(matches!(parse_frame("XX what"), AfddFrame::Unknown(_)));
    assert!(matches!(parse_frame(""), AfddFrame::Unknown(_)));
}

#[test]
fn line_reader_handles_torn_crlf_lines() {
    let mut reader = LineReader::new();
    assert!(reader.feed(b"IS 1 2").is_empty());
    let lines = reader.feed(b" 3\r\nAM 1\r\nNH ");
    assert_eq!(lines, vec!["IS 1 2 3".to_string(), "AM 1".to_string()]);
    assert_eq!(reader.feed(b"7\n"), vec!["NH 7".to_string()]);
    assert_eq!(reader.pending(), 0);
}

#[test]
fn client_commands_are_crlf_terminated() {
    assert_eq!(ClientCmd::StartStat.as_line(), "SS\r\n");
    assert_eq!(ClientCmd::Stat.as_line(), "ST\r\n");
    assert_eq!(ClientCmd::Quit.as_line(), "QUIT\r\n");
}

#[test]
fn nh_and_mc_frames() {
    assert_eq!(parse_frame("NH 12"), AfddFrame::NoOfHosts(12));
    assert_eq!(parse_frame("MC 50"), AfddFrame::MaxConnections(50));
}
