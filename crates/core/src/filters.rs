// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure file filters applied before a transfer touches the wire.
//!
//! The ignore filters compare a file attribute against a configured
//! reference with a tri-sign: when a filter is enabled, only files for
//! which the selected comparison holds are fetched; everything else is
//! ignored. A reference of 0 disables the filter.

use serde::{Deserialize, Serialize};

/// Comparison selector for the ignore-size and ignore-mtime filters.
///
/// The sign is written from the reference's point of view: `LessThan`
/// with a reference of 1024 selects files whose attribute exceeds 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TriSign {
    #[default]
    Equal,
    LessThan,
    GreaterThan,
}

impl TriSign {
    fn matches(self, value: i64, reference: i64) -> bool {
        match self {
            TriSign::Equal => value == reference,
            TriSign::LessThan => reference < value,
            TriSign::GreaterThan => reference > value,
        }
    }
}

/// True when the file must be skipped because of its size: the filter
/// is enabled and the size does not satisfy the selected comparison.
pub fn ignore_size(sign: TriSign, reference: i64, size: i64) -> bool {
    reference != 0 && !sign.matches(size, reference)
}

/// True when the file must be skipped because of its age.
///
/// `age` is `now - mtime` in seconds.
pub fn ignore_mtime(sign: TriSign, reference: i64, age: i64) -> bool {
    reference != 0 && !sign.matches(age, reference)
}

/// True when a spool file is past the job's age limit and must be
/// deleted instead of sent.
pub fn age_limit_expired(age_limit: i64, now: i64, mtime: i64) -> bool {
    age_limit > 0 && now - mtime > age_limit
}

#[cfg(test)]
#[path = "filters_tests.rs"]
mod tests;
