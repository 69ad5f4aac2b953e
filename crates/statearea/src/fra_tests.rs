// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::records::DIR_DISABLED;

fn sample_dirs() -> Vec<DirConfig> {
    let mut d1 = DirConfig::new("d1", "loc:///srv/in-one");
    d1.poll_interval = 30;
    let d2 = DirConfig::new("d2", "loc:///srv/in-two");
    vec![d1, d2]
}

#[test]
fn create_and_find_by_alias() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fra_status");
    let fra = Fra::create(&path, &sample_dirs()).unwrap();
    assert_eq!(fra.count(), 2);
    assert_eq!(fra.position_of("d2"), Some(1));
    assert_eq!(fra.dir(0).unwrap().url(), "loc:///srv/in-one");
}

#[test]
fn due_skips_disabled_queued_and_future_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fra_status");
    let mut fra = Fra::create(&path, &sample_dirs()).unwrap();

    fra.dir_mut(0).unwrap().next_check_time = 100;
    fra.dir_mut(1).unwrap().next_check_time = 100;
    assert_eq!(fra.due(100), vec![0, 1]);
    assert_eq!(fra.due(99), Vec::<usize>::new());

    fra.dir_mut(0).unwrap().queued = 1;
    assert_eq!(fra.due(100), vec![1]);

    fra.dir_mut(1).unwrap().dir_flag |= DIR_DISABLED;
    assert_eq!(fra.due(100), Vec::<usize>::new());
}

#[test]
fn tri_sign_bytes_round_trip() {
    for sign in [TriSign::Equal, TriSign::LessThan, TriSign::GreaterThan] {
        assert_eq!(tri_sign_from_byte(tri_sign_byte(sign)), sign);
    }
}

#[test]
fn ignore_filters_stored_in_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fra_status");
    let mut cfg = DirConfig::new("d1", "loc:///srv/in");
    cfg.ignore_size = Some((TriSign::GreaterThan, 1024));
    cfg.ignore_file_time = Some((TriSign::LessThan, 3600));
    let fra = Fra::create(&path, &[cfg]).unwrap();
    let rec = fra.dir(0).unwrap();
    assert_eq!(rec.ignore_size, 1024);
    assert_eq!(tri_sign_from_byte(rec.gt_lt_sign_size), TriSign::GreaterThan);
    assert_eq!(rec.ignore_file_time, 3600);
    assert_eq!(tri_sign_from_byte(rec.gt_lt_sign_time), TriSign::LessThan);
}
