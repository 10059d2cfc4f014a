// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Startup configuration errors.
//!
//! Every variant is fatal: configuration is validated once when the gate is
//! built and never re-checked per request.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Malformed credential or allowlist input.
#[derive(Debug)]
pub enum ConfigError {
    /// Entry does not have the `username:password[:port]` shape.
    MalformedCredential(String),
    /// Username or password is empty.
    EmptyField(String),
    /// Port suffix is not a number in 1..=65535.
    InvalidPort(String),
    /// The same username was loaded twice.
    DuplicateUser(String),
    /// Allowlist entry has an unparsable address or extra `/` separators.
    InvalidAddress(String),
    /// Allowlist mask is non-numeric or wider than the address family.
    InvalidMask { entry: String, max: u8 },
    /// Credential file could not be read.
    CredentialFile { path: PathBuf, source: io::Error },
    /// A credential file line failed to parse.
    CredentialLine {
        path: PathBuf,
        line: usize,
        source: Box<ConfigError>,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MalformedCredential(entry) => write!(
                f,
                "user password {:?} syntax wrong, should be username:password[:port]",
                entry
            ),
            ConfigError::EmptyField(entry) => write!(
                f,
                "user password {:?} should not contain empty user name or password",
                entry
            ),
            ConfigError::InvalidPort(entry) => {
                write!(f, "user password {:?} has an invalid port", entry)
            }
            ConfigError::DuplicateUser(user) => write!(f, "duplicate user: {}", user),
            ConfigError::InvalidAddress(entry) => {
                write!(f, "allowed client {:?}: ip address not valid", entry)
            }
            ConfigError::InvalidMask { entry, max } => write!(
                f,
                "allowed client {:?}: mask bits must be a number <= {}",
                entry, max
            ),
            ConfigError::CredentialFile { path, source } => write!(
                f,
                "error opening user password file {}: {}",
                path.display(),
                source
            ),
            ConfigError::CredentialLine { path, line, source } => {
                write!(f, "{}:{}: {}", path.display(), line, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::CredentialFile { source, .. } => Some(source),
            ConfigError::CredentialLine { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
