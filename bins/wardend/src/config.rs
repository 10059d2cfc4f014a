//! Command-line and JSON configuration for wardend.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use warden_auth::{AuthConfig, AuthConfigBuilder};
use warden_cache::ClientCache;

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_AUTH_TIMEOUT_HOURS: u64 = 2;
const DEFAULT_NONCE_MAX_AGE_SECS: u64 = 60;

/// Proxy front door that runs every request through the authentication gate
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Args {
    /// Listen address (TCP)
    #[arg(long)]
    pub listen: Option<String>,
    /// Inline credential, username:password[:port]
    #[arg(long)]
    pub user_passwd: Option<String>,
    /// File of username:password[:port] entries, one per line
    #[arg(long)]
    pub user_passwd_file: Option<PathBuf>,
    /// Comma-separated ip[/maskbits] list that skips authentication
    #[arg(long)]
    pub allowed_client: Option<String>,
    /// Hours an authenticated client stays trusted
    #[arg(long)]
    pub auth_timeout_hours: Option<u64>,
    /// Seconds a challenge nonce stays valid
    #[arg(long)]
    pub nonce_max_age_secs: Option<u64>,
    /// JSON file supplying any of the options above
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Keys accepted in the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub listen: Option<String>,
    pub user_passwd: Option<String>,
    pub user_passwd_file: Option<PathBuf>,
    pub allowed_client: Option<String>,
    pub auth_timeout_hours: Option<u64>,
    pub nonce_max_age_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Effective settings after merging CLI values over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub listen: String,
    pub user_passwd: Option<String>,
    pub user_passwd_file: Option<PathBuf>,
    pub allowed_client: Option<String>,
    pub auth_timeout: Duration,
    pub nonce_max_age: Duration,
}

impl Settings {
    pub fn merge(args: Args, file: FileConfig) -> Self {
        Self {
            listen: args
                .listen
                .or(file.listen)
                .unwrap_or_else(|| DEFAULT_LISTEN.to_owned()),
            user_passwd: args.user_passwd.or(file.user_passwd),
            user_passwd_file: args.user_passwd_file.or(file.user_passwd_file),
            allowed_client: args.allowed_client.or(file.allowed_client),
            auth_timeout: Duration::from_secs(
                args.auth_timeout_hours
                    .or(file.auth_timeout_hours)
                    .unwrap_or(DEFAULT_AUTH_TIMEOUT_HOURS)
                    .saturating_mul(3600),
            ),
            nonce_max_age: Duration::from_secs(
                args.nonce_max_age_secs
                    .or(file.nonce_max_age_secs)
                    .unwrap_or(DEFAULT_NONCE_MAX_AGE_SECS),
            ),
        }
    }

    /// Parses the command line and, if `--config` is given, the JSON file.
    pub fn from_args(args: Args) -> Result<Self> {
        let file = match args.config.as_deref() {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(args, file))
    }

    /// Gate configuration backed by `cache`.
    pub fn auth_config(&self, cache: Arc<dyn ClientCache>) -> AuthConfigBuilder {
        let mut builder = AuthConfig::builder()
            .auth_timeout(self.auth_timeout)
            .nonce_max_age(self.nonce_max_age)
            .cache(cache);
        if let Some(entry) = &self.user_passwd {
            builder = builder.user_passwd(entry.as_str());
        }
        if let Some(path) = &self.user_passwd_file {
            builder = builder.user_passwd_file(path.as_path());
        }
        if let Some(list) = &self.allowed_client {
            builder = builder.allowed_client(list.as_str());
        }
        builder
    }
}
