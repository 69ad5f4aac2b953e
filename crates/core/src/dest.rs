// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination URLs as they appear in job messages.
//!
//! Grammar: `scheme://[user[:password]@]host[:port][/path]`. Only the
//! components the core depends on are modeled; protocol wire behavior
//! lives behind the worker's transport seam.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("destination `{0}` has no scheme separator")]
    NoScheme(String),
    #[error("unknown scheme `{0}`")]
    UnknownScheme(String),
    #[error("invalid port in `{0}`")]
    BadPort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Local filesystem move/copy.
    Loc,
    Ftp,
    Ftps,
    Sftp,
    Scp,
}

impl Scheme {
    fn parse(s: &str) -> Result<Self, DestinationError> {
        match s {
            "loc" | "file" => Ok(Scheme::Loc),
            "ftp" => Ok(Scheme::Ftp),
            "ftps" => Ok(Scheme::Ftps),
            "sftp" => Ok(Scheme::Sftp),
            "scp" => Ok(Scheme::Scp),
            other => Err(DestinationError::UnknownScheme(other.to_string())),
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Loc => 0,
            Scheme::Ftp => 21,
            Scheme::Ftps => 990,
            Scheme::Sftp | Scheme::Scp => 22,
        }
    }
}

/// Parsed destination of a send job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub scheme: Scheme,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    /// Target directory. For `loc` this is an absolute local path.
    pub directory: String,
}

impl Destination {
    pub fn parse(raw: &str) -> Result<Self, DestinationError> {
        let (scheme_str, rest) = raw
            .split_once("://")
            .ok_or_else(|| DestinationError::NoScheme(raw.to_string()))?;
        let scheme = Scheme::parse(scheme_str)?;

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        let (userinfo, hostport) = match authority.rsplit_once('@') {
            Some((u, h)) => (Some(u), h),
            None => (None, authority),
        };
        let (user, password) = match userinfo {
            Some(u) => match u.split_once(':') {
                Some((name, pw)) => (Some(name.to_string()), Some(pw.to_string())),
                None => (Some(u.to_string()), None),
            },
            None => (None, None),
        };

        let (host, port) = match hostport.rsplit_once(':') {
            Some((h, p)) => {
                let port: u16 = p
                    .parse()
                    .map_err(|_| DestinationError::BadPort(raw.to_string()))?;
                (h.to_string(), port)
            }
            None => (hostport.to_string(), scheme.default_port()),
        };

        Ok(Self { scheme, user, password, host, port, directory: path.to_string() })
    }

    /// True when a job for `other` can reuse a connection opened for
    /// `self` without reconnecting.
    ///
    /// Ports must match for every scheme; scp additionally pins the
    /// target directory and sftp the user, mirroring the burst rules the
    /// supervisor enforces.
    pub fn burst_compatible(&self, other: &Destination) -> bool {
        if self.scheme != other.scheme || self.host != other.host || self.port != other.port {
            return false;
        }
        match self.scheme {
            Scheme::Scp => self.directory == other.directory && self.user == other.user,
            Scheme::Sftp => self.user == other.user,
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "dest_tests.rs"]
mod tests;
