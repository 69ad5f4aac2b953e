// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Evaluation of the AFD_MON_CONFIG file.
//!
//! Whitespace-separated columns, `#` comments:
//! `alias [hostname [port [poll_interval [user[->remote_user]]]]]`.
//! Missing columns take defaults, oversized or non-numeric values are
//! logged and replaced; a config line never aborts the evaluation.

use afd_core::limits::{DEFAULT_AFD_PORT, DEFAULT_POLL_INTERVAL, MAX_INT_LENGTH};
use afd_core::{AfdAlias, MAX_REAL_HOSTNAME_LENGTH};
use afd_statearea::MonConfigRow;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse the config file into monitor rows.
pub fn eval_afd_mon_config(path: &Path) -> Result<Vec<MonConfigRow>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(eval_text(&text))
}

/// Parse config text; separated from I/O for tests.
pub fn eval_text(text: &str) -> Vec<MonConfigRow> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_ascii_whitespace();
        let Some(alias_raw) = fields.next() else { continue };
        let alias = AfdAlias::new(alias_raw);

        let hostname = match fields.next() {
            Some(h) => {
                let mut h = h.to_string();
                if h.len() >= MAX_REAL_HOSTNAME_LENGTH {
                    tracing::warn!(alias = %alias, hostname = %h,
                        max = MAX_REAL_HOSTNAME_LENGTH - 1,
                        "hostname exceeds maximum length, truncating");
                    h.truncate(MAX_REAL_HOSTNAME_LENGTH - 1);
                }
                h
            }
            None => alias.as_str().to_string(),
        };

        let port = parse_numeric(fields.next(), &alias, "TCP port", u32::from(DEFAULT_AFD_PORT));
        let port = u16::try_from(port).unwrap_or_else(|_| {
            tracing::warn!(alias = %alias, port, "port out of range, using default");
            DEFAULT_AFD_PORT
        });

        let poll_interval =
            parse_numeric(fields.next(), &alias, "poll interval", DEFAULT_POLL_INTERVAL);

        let convert_username = fields.next().map(|spec| match spec.split_once("->") {
            Some((local, remote)) => (local.to_string(), remote.to_string()),
            None => (spec.to_string(), spec.to_string()),
        });

        rows.push(MonConfigRow { alias, hostname, port, poll_interval, convert_username });
    }
    rows
}

/// Numeric field with the historical tolerance rules: any non-digit or
/// an over-long number falls back to the default with a warning.
fn parse_numeric(field: Option<&str>, alias: &AfdAlias, what: &str, default: u32) -> u32 {
    let Some(raw) = field else { return default };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        tracing::warn!(alias = %alias, field = %raw, what,
            "non numeric character in field, using default");
        return default;
    }
    if raw.len() >= MAX_INT_LENGTH {
        tracing::warn!(alias = %alias, field = %raw, what,
            "numeric value too large to store, using default");
        return default;
    }
    raw.parse().unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
