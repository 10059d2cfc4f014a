// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! User credentials and the username-keyed credential store.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use smol_str::SmolStr;

use crate::digest;
use crate::error::ConfigError;
use crate::REALM;

/// A configured proxy user.
///
/// The digest key (HA1) is derived from `username:realm:secret` the first
/// time it is needed and reused afterwards.
#[derive(Debug, Clone)]
pub struct UserCredential {
    username: SmolStr,
    secret: SmolStr,
    /// 0 means any local port.
    port: u16,
    digest_key: OnceCell<String>,
}

impl UserCredential {
    pub fn new(username: impl Into<SmolStr>, secret: impl Into<SmolStr>, port: u16) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            port,
            digest_key: OnceCell::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether a connection accepted on `local_port` may use this credential.
    pub fn allows_port(&self, local_port: u16) -> bool {
        self.port == 0 || self.port == local_port
    }

    /// H(username:realm:secret), computed at most once.
    pub fn digest_key(&self) -> &str {
        self.digest_key
            .get_or_init(|| digest::digest_key(&self.username, REALM, &self.secret))
    }
}

/// Credentials keyed by username. Usernames are unique.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<SmolStr, UserCredential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a credential, rejecting a username that is already present.
    pub fn insert(&mut self, credential: UserCredential) -> Result<(), ConfigError> {
        if self.users.contains_key(credential.username()) {
            return Err(ConfigError::DuplicateUser(credential.username().to_owned()));
        }
        self.users.insert(credential.username.clone(), credential);
        Ok(())
    }

    pub fn get(&self, username: &str) -> Option<&UserCredential> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
