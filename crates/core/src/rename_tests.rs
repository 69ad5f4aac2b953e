// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn non_matching_rule_returns_none() {
    let rule = RenameRule::new(r"^data_", "out_").unwrap();
    assert_eq!(rule.apply("report.txt"), None);
}

#[test]
fn matching_rule_rewrites_prefix() {
    let rule = RenameRule::new(r"^data_", "out_").unwrap();
    assert_eq!(rule.apply("data_2020.bin").as_deref(), Some("out_2020.bin"));
}

#[test]
fn capture_groups_carry_through() {
    let rule = RenameRule::new(r"^(\w+)\.tmp$", "$1.dat").unwrap();
    assert_eq!(rule.apply("payload.tmp").as_deref(), Some("payload.dat"));
}

#[test]
fn first_matching_rule_wins() {
    let rules = vec![
        RenameRule::new(r"\.a$", ".one").unwrap(),
        RenameRule::new(r"\.b$", ".two").unwrap(),
        RenameRule::new(r"\.a$", ".never").unwrap(),
    ];
    assert_eq!(apply_rules(&rules, "f.a"), "f.one");
    assert_eq!(apply_rules(&rules, "f.b"), "f.two");
    assert_eq!(apply_rules(&rules, "f.c"), "f.c");
}

#[test]
fn bad_pattern_is_rejected() {
    assert!(RenameRule::new(r"([", "x").is_err());
}

#[test]
fn rules_survive_serde_round_trip() {
    let rule = RenameRule::new(r"^x", "y").unwrap();
    let json = serde_json::to_string(&rule).unwrap();
    let back: RenameRule = serde_json::from_str(&json).unwrap();
    assert_eq!(back.apply("xfile").as_deref(), Some("yfile"));
}
