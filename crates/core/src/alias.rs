// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alias newtypes for hosts, fetch directories, and remote AFDs.
//!
//! Aliases come from hand-edited config files, so construction truncates
//! over-long input instead of rejecting it, logging a warning the way the
//! config evaluators always have.

use crate::limits::{MAX_AFD_ALIAS_LENGTH, MAX_DIR_ALIAS_LENGTH, MAX_HOST_ALIAS_LENGTH};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! alias_type {
    ($(#[$doc:meta])* $name:ident, $max:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Maximum number of bytes kept from the input.
            pub const MAX_LENGTH: usize = $max;

            /// Create an alias, truncating to [`Self::MAX_LENGTH`] bytes.
            pub fn new(raw: impl Into<String>) -> Self {
                let mut s: String = raw.into();
                if s.len() > Self::MAX_LENGTH {
                    tracing::warn!(
                        alias = %s,
                        max = Self::MAX_LENGTH,
                        "alias exceeds maximum length, truncating"
                    );
                    let mut cut = Self::MAX_LENGTH;
                    while !s.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    s.truncate(cut);
                }
                Self(s)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

alias_type!(
    /// Alias of an outbound host in the FSA.
    HostAlias,
    MAX_HOST_ALIAS_LENGTH
);

alias_type!(
    /// Alias of a fetch directory in the FRA.
    DirAlias,
    MAX_DIR_ALIAS_LENGTH
);

alias_type!(
    /// Alias of a remote AFD monitored through the MSA.
    AfdAlias,
    MAX_AFD_ALIAS_LENGTH
);

#[cfg(test)]
#[path = "alias_tests.rs"]
mod tests;
