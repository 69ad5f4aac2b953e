// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The permissions file: one line per user granting command tokens.
//!
//! Grammar: `user token[,token...]` (whitespace around commas is
//! tolerated). `all` implies every token. A missing permissions file
//! means permission checking is disabled and everybody may do
//! everything, which is how these installations have always behaved.

use std::collections::HashSet;
use std::path::Path;

/// One grantable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    All,
    MonCtrl,
    MonStartup,
    MonShutdown,
    MafdCmd,
    DisableAfd,
    Retry,
}

impl Token {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Token::All),
            "mon_ctrl" => Some(Token::MonCtrl),
            "mon_startup" => Some(Token::MonStartup),
            "mon_shutdown" => Some(Token::MonShutdown),
            "mafd_cmd" => Some(Token::MafdCmd),
            "disable_afd" => Some(Token::DisableAfd),
            "retry" => Some(Token::Retry),
            _ => None,
        }
    }
}

/// The tokens granted to one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    tokens: HashSet<Token>,
    /// No permissions file: everything goes.
    unrestricted: bool,
}

impl PermissionSet {
    pub fn unrestricted() -> Self {
        Self { tokens: HashSet::new(), unrestricted: true }
    }

    pub fn has(&self, token: Token) -> bool {
        self.unrestricted || self.tokens.contains(&Token::All) || self.tokens.contains(&token)
    }

    pub fn is_empty(&self) -> bool {
        !self.unrestricted && self.tokens.is_empty()
    }
}

/// Parse the whole permissions file text.
pub fn parse_permissions(text: &str, user: &str) -> PermissionSet {
    let mut set = PermissionSet::default();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_ascii_whitespace();
        if fields.next() != Some(user) {
            continue;
        }
        for chunk in fields {
            for raw in chunk.split(',') {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                match Token::parse(raw) {
                    Some(token) => {
                        set.tokens.insert(token);
                    }
                    None => {
                        tracing::warn!(user, token = raw, "unknown permission token, ignoring");
                    }
                }
            }
        }
    }
    set
}

/// Look a user up in the permissions file at `path`.
pub fn lookup_permissions(path: &Path, user: &str) -> PermissionSet {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_permissions(&text, user),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PermissionSet::unrestricted(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e,
                "cannot read permissions file, denying");
            PermissionSet::default()
        }
    }
}

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;
