// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Startup assembly of the gate configuration.
//!
//! Three independent textual inputs feed the gate: an inline
//! `username:password[:port]` entry, a file of such entries, and a
//! comma-separated allowlist. Any malformed entry fails [`AuthConfigBuilder::build`];
//! nothing is re-validated per request.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use warden_cache::{ClientCache, TtlSet};
use warden_core::{ConfigError, CredentialStore, NetworkRange, REALM};
use warden_parse::{parse_allowlist, parse_credential_entry};

use crate::challenge::ChallengeTemplate;
use crate::nonce::{NonceService, DEFAULT_NONCE_MAX_AGE};

/// How long an authenticated client skips the handshake, by default.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(2 * 3600);

/// Immutable authentication settings shared by every connection.
pub struct AuthConfig {
    required: bool,
    users: CredentialStore,
    allowed_clients: Vec<NetworkRange>,
    authed: Arc<dyn ClientCache>,
    nonces: NonceService,
    challenge: ChallengeTemplate,
}

impl AuthConfig {
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// False when no credentials and no allowlist were configured.
    pub fn required(&self) -> bool {
        self.required
    }

    pub fn users(&self) -> &CredentialStore {
        &self.users
    }

    pub fn allowed_clients(&self) -> &[NetworkRange] {
        &self.allowed_clients
    }

    pub fn authed(&self) -> &dyn ClientCache {
        self.authed.as_ref()
    }

    pub fn nonces(&self) -> &NonceService {
        &self.nonces
    }

    pub fn challenge(&self) -> &ChallengeTemplate {
        &self.challenge
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("required", &self.required)
            .field("users", &self.users.len())
            .field("allowed_clients", &self.allowed_clients)
            .field("nonces", &self.nonces)
            .finish_non_exhaustive()
    }
}

/// Collects the configuration inputs and validates them in one pass.
#[derive(Default)]
pub struct AuthConfigBuilder {
    user_passwd: Option<String>,
    user_passwd_file: Option<PathBuf>,
    allowed_client: Option<String>,
    auth_timeout: Option<Duration>,
    nonce_max_age: Option<Duration>,
    cache: Option<Arc<dyn ClientCache>>,
}

impl AuthConfigBuilder {
    /// Inline `username:password[:port]` entry.
    pub fn user_passwd(mut self, entry: impl Into<String>) -> Self {
        self.user_passwd = Some(entry.into());
        self
    }

    /// Newline-delimited file of `username:password[:port]` entries.
    pub fn user_passwd_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_passwd_file = Some(path.into());
        self
    }

    /// Comma-separated `ip[/maskbits]` list exempt from credential checks.
    pub fn allowed_client(mut self, list: impl Into<String>) -> Self {
        self.allowed_client = Some(list.into());
        self
    }

    /// Expiry of the authenticated-client cache built by default.
    pub fn auth_timeout(mut self, ttl: Duration) -> Self {
        self.auth_timeout = Some(ttl);
        self
    }

    pub fn nonce_max_age(mut self, max_age: Duration) -> Self {
        self.nonce_max_age = Some(max_age);
        self
    }

    /// Uses an existing cache instead of a fresh [`TtlSet`].
    pub fn cache(mut self, cache: Arc<dyn ClientCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<AuthConfig, ConfigError> {
        let user_passwd = self.user_passwd.unwrap_or_default();
        let allowed_client = self.allowed_client.unwrap_or_default();
        let required = !user_passwd.is_empty()
            || self
                .user_passwd_file
                .as_ref()
                .is_some_and(|p| !p.as_os_str().is_empty())
            || !allowed_client.is_empty();

        let mut users = CredentialStore::new();
        if let Some(cred) = parse_credential_entry(&user_passwd)? {
            debug!(user = cred.username(), port = cred.port(), "loaded user");
            users.insert(cred)?;
        }
        if let Some(path) = self
            .user_passwd_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            load_credential_file(path, &mut users)?;
        }
        let allowed_clients = parse_allowlist(&allowed_client)?;

        let authed = self.cache.unwrap_or_else(|| {
            Arc::new(TtlSet::new(self.auth_timeout.unwrap_or(DEFAULT_AUTH_TIMEOUT)))
        });

        Ok(AuthConfig {
            required,
            users,
            allowed_clients,
            authed,
            nonces: NonceService::new(self.nonce_max_age.unwrap_or(DEFAULT_NONCE_MAX_AGE)),
            challenge: ChallengeTemplate::new(REALM),
        })
    }
}

/// Adds every entry of a credential file to `store`.
///
/// Blank lines and lines starting with `#` are skipped. The first bad line
/// aborts loading with its line number.
pub fn load_credential_file(path: &Path, store: &mut CredentialStore) -> Result<(), ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::CredentialFile {
        path: path.to_path_buf(),
        source,
    })?;

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let at_line = |source: ConfigError| ConfigError::CredentialLine {
            path: path.to_path_buf(),
            line: idx + 1,
            source: Box::new(source),
        };
        if let Some(cred) = parse_credential_entry(line).map_err(at_line)? {
            debug!(user = cred.username(), port = cred.port(), "loaded user");
            store.insert(cred).map_err(at_line)?;
        }
    }
    Ok(())
}
