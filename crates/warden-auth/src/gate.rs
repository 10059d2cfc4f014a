// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-request authentication flow.
//!
//! Each request is decided by the first matching step:
//! open gate, cached client, allowlisted client, digest credentials.
//! Anything else receives a fresh 407 challenge.

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use smol_str::SmolStr;
use tracing::{debug, error, info, warn};
use warden_observe::auth_metrics;

use crate::challenge::bad_request_page;
use crate::config::AuthConfig;
use crate::digest::{DigestRequest, DigestVerifier, Verdict};

/// Connection the gate answers on.
///
/// Only the addresses and a way to write a response are needed; reading
/// and forwarding stay with the caller.
#[async_trait]
pub trait ClientConn: Send {
    fn remote_addr(&self) -> SocketAddr;
    fn local_addr(&self) -> SocketAddr;
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
}

/// The request facts the gate consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub method: SmolStr,
    pub uri: SmolStr,
    /// Raw `Proxy-Authorization` value, if the header was sent.
    pub proxy_authorization: Option<SmolStr>,
}

impl ProxyRequest {
    pub fn new(method: impl Into<SmolStr>, uri: impl Into<SmolStr>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            proxy_authorization: None,
        }
    }

    pub fn with_proxy_authorization(mut self, value: impl Into<SmolStr>) -> Self {
        self.proxy_authorization = Some(value.into());
        self
    }
}

/// How an authenticated client got through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthPath {
    /// Authentication is not configured.
    Open,
    Cached,
    Allowlisted,
    Digest,
}

impl AuthPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthPath::Open => "open",
            AuthPath::Cached => "cached",
            AuthPath::Allowlisted => "allowlist",
            AuthPath::Digest => "digest",
        }
    }
}

impl fmt::Display for AuthPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Malformed or unsupported authorization; the 400 page was sent.
    Protocol,
    /// Writing the response failed.
    Internal,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Protocol => "protocol",
            Rejection::Internal => "internal",
        }
    }
}

/// Outcome of [`AuthGate::authenticate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Proceed with proxying. Nothing was written.
    Authenticated(AuthPath),
    /// A 407 was written; keep the connection open for the retry.
    ChallengeIssued,
    /// The connection must be closed.
    Rejected(Rejection),
}

impl GateDecision {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, GateDecision::Authenticated(_))
    }

    pub fn should_close(&self) -> bool {
        matches!(self, GateDecision::Rejected(_))
    }

    pub fn state(&self) -> GateState {
        match self {
            GateDecision::Authenticated(_) => GateState::Authenticated,
            GateDecision::ChallengeIssued => GateState::ChallengeIssued,
            GateDecision::Rejected(_) => GateState::Rejected,
        }
    }
}

/// Where a connection stands in the handshake.
///
/// `ChallengeIssued` may repeat any number of times on one connection;
/// `Authenticated` and `Rejected` are terminal for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    NotChecked,
    Authenticated,
    ChallengeIssued,
    Rejected,
}

/// Decides whether a client may use the proxy.
#[derive(Debug, Clone)]
pub struct AuthGate {
    config: Arc<AuthConfig>,
    verifier: DigestVerifier,
}

impl AuthGate {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let verifier = DigestVerifier::new(*config.nonces());
        Self { config, verifier }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Runs the authentication flow for one request on `conn`.
    ///
    /// Writes at most one response (a 407 challenge or the 400 page) and
    /// never closes the connection itself.
    pub async fn authenticate<C>(&self, conn: &mut C, request: &ProxyRequest) -> GateDecision
    where
        C: ClientConn + ?Sized,
    {
        if !self.config.required() {
            return self.accepted(AuthPath::Open);
        }

        let client_ip = conn.remote_addr().ip().to_canonical();
        let client = client_ip.to_string();

        if self.config.authed().has(&client) {
            debug!(%client, "client in auth cache");
            return self.accepted(AuthPath::Cached);
        }

        if self.is_allowlisted(&client_ip) {
            debug!(%client, "client in allowlist");
            return self.accepted(AuthPath::Allowlisted);
        }

        // A blank header counts as missing.
        let header = request
            .proxy_authorization
            .as_deref()
            .filter(|value| !value.trim().is_empty());
        if let Some(header) = header {
            let digest_request = DigestRequest {
                method: &request.method,
                uri: &request.uri,
                local_port: conn.local_addr().port(),
            };
            match self
                .verifier
                .verify(header, self.config.users(), &digest_request)
            {
                Verdict::Accepted { username } => {
                    self.config.authed().add(&client);
                    info!(%client, user = %username, "client authenticated");
                    return self.accepted(AuthPath::Digest);
                }
                Verdict::AuthRequired(reason) => {
                    warn!(%client, %reason, "authentication failed");
                }
                Verdict::ProtocolError(violation) => {
                    warn!(%client, %violation, "bad authorization request");
                    let decision = match conn.write_all(&bad_request_page()).await {
                        Ok(()) => GateDecision::Rejected(Rejection::Protocol),
                        Err(err) => {
                            error!(%client, error = %err, "failed to send 400 response");
                            GateDecision::Rejected(Rejection::Internal)
                        }
                    };
                    return self.rejected(decision);
                }
            }
        }

        let nonce = self.config.nonces().generate();
        let challenge = self.config.challenge().render(&nonce);
        match conn.write_all(&challenge).await {
            Ok(()) => {
                debug!(%client, %nonce, "challenge issued");
                auth_metrics().on_challenge();
                GateDecision::ChallengeIssued
            }
            Err(err) => {
                error!(%client, error = %err, "failed to send challenge");
                self.rejected(GateDecision::Rejected(Rejection::Internal))
            }
        }
    }

    fn is_allowlisted(&self, ip: &IpAddr) -> bool {
        self.config
            .allowed_clients()
            .iter()
            .any(|range| range.contains(ip))
    }

    fn accepted(&self, path: AuthPath) -> GateDecision {
        auth_metrics().on_authenticated(path.as_str());
        GateDecision::Authenticated(path)
    }

    fn rejected(&self, decision: GateDecision) -> GateDecision {
        if let GateDecision::Rejected(kind) = decision {
            auth_metrics().on_rejected(kind.as_str());
        }
        decision
    }
}
