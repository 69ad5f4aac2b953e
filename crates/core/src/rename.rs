// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer-time rename rules.
//!
//! A rule is a regex filter plus a replacement template using `$1`-style
//! capture references. Rules are pure over the file name, which keeps
//! them trivially testable away from any transfer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenameRuleError {
    #[error("invalid rename pattern `{pattern}`: {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A single filter/replacement pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRule {
    pattern: String,
    replacement: String,
    #[serde(skip)]
    compiled: Option<Regex>,
}

impl RenameRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, RenameRuleError> {
        let compiled = Regex::new(pattern).map_err(|source| RenameRuleError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            compiled: Some(compiled),
        })
    }

    /// Apply the rule to a file name.
    ///
    /// Returns `None` when the filter does not match; the caller keeps the
    /// original name in that case.
    pub fn apply(&self, name: &str) -> Option<String> {
        let re = match &self.compiled {
            Some(re) => re,
            // Deserialized rules compile lazily on first use.
            None => return Self::new(&self.pattern, &self.replacement).ok()?.apply(name),
        };
        if !re.is_match(name) {
            return None;
        }
        Some(re.replace(name, self.replacement.as_str()).into_owned())
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Apply the first matching rule of a list, or keep the name.
pub fn apply_rules(rules: &[RenameRule], name: &str) -> String {
    for rule in rules {
        if let Some(renamed) = rule.apply(name) {
            return renamed;
        }
    }
    name.to_string()
}

#[cfg(test)]
#[path = "rename_tests.rs"]
mod tests;
