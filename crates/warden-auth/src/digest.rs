// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Digest verification of `Proxy-Authorization` responses.
//!
//! One algorithm (MD5) and one qop (`auth`) are implemented. Checks run in a
//! fixed order so that malformed input is reported before any credential
//! lookup, and so that unknown users, wrong passwords and stale nonces all
//! collapse into the same retryable [`Verdict::AuthRequired`].

use std::fmt;

use smol_str::SmolStr;
use subtle::ConstantTimeEq;
use warden_core::digest::request_digest;
use warden_core::{CredentialStore, QOP_AUTH};
use warden_parse::parse_proxy_authorization;

use crate::nonce::{Freshness, NonceService};

/// Request facts the digest is bound to.
#[derive(Debug, Clone, Copy)]
pub struct DigestRequest<'a> {
    pub method: &'a str,
    /// Request target, used when the client omits the `uri` parameter.
    pub uri: &'a str,
    /// Port the client connected to.
    pub local_port: u16,
}

/// Result of checking one `Proxy-Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted { username: SmolStr },
    /// Retryable: issue a fresh challenge.
    AuthRequired(DenyReason),
    /// Not retryable: the client speaks something this gate does not implement.
    ProtocolError(ProtocolViolation),
}

/// Why credentials were refused. Logged server-side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    StaleNonce,
    UnknownUser(SmolStr),
    PortMismatch { username: SmolStr, local_port: u16 },
    DigestMismatch(SmolStr),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::StaleNonce => write!(f, "nonce expired"),
            DenyReason::UnknownUser(user) => write!(f, "no such user: {}", user),
            DenyReason::PortMismatch {
                username,
                local_port,
            } => write!(f, "user {} not allowed on port {}", username, local_port),
            DenyReason::DigestMismatch(user) => {
                write!(f, "digest not match for {}, maybe password wrong", user)
            }
        }
    }
}

/// Malformed or unsupported authorization input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    MalformedHeader(String),
    UnsupportedScheme(SmolStr),
    EmptyParams,
    BadNonce(SmolStr),
    UnsupportedQop(SmolStr),
    MissingResponse,
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolViolation::MalformedHeader(msg) => {
                write!(f, "malformed Proxy-Authorization header: {}", msg)
            }
            ProtocolViolation::UnsupportedScheme(scheme) => {
                write!(f, "unsupported authenticate method: {}", scheme)
            }
            ProtocolViolation::EmptyParams => write!(f, "empty authorization list"),
            ProtocolViolation::BadNonce(nonce) => write!(f, "nonce not a timestamp: {:?}", nonce),
            ProtocolViolation::UnsupportedQop(qop) => write!(f, "qop wrong: {:?}", qop),
            ProtocolViolation::MissingResponse => write!(f, "no request-digest"),
        }
    }
}

/// Verifies digest responses against a credential store.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestVerifier {
    nonces: NonceService,
}

impl DigestVerifier {
    pub fn new(nonces: NonceService) -> Self {
        Self { nonces }
    }

    pub fn nonces(&self) -> &NonceService {
        &self.nonces
    }

    /// Checks `header` (the raw `Proxy-Authorization` value) for `request`.
    pub fn verify(
        &self,
        header: &str,
        store: &CredentialStore,
        request: &DigestRequest<'_>,
    ) -> Verdict {
        let auth = match parse_proxy_authorization(header) {
            Ok(auth) => auth,
            Err(err) => {
                return Verdict::ProtocolError(ProtocolViolation::MalformedHeader(err.to_string()))
            }
        };
        if !auth.is_digest() {
            return Verdict::ProtocolError(ProtocolViolation::UnsupportedScheme(SmolStr::new(
                auth.scheme(),
            )));
        }
        if auth.is_empty() {
            return Verdict::ProtocolError(ProtocolViolation::EmptyParams);
        }

        let nonce = auth.param("nonce").unwrap_or_default();
        match self.nonces.validate(nonce) {
            Freshness::Fresh => {}
            Freshness::Stale => return Verdict::AuthRequired(DenyReason::StaleNonce),
            Freshness::Invalid => {
                return Verdict::ProtocolError(ProtocolViolation::BadNonce(SmolStr::new(nonce)))
            }
        }

        let username = auth.param("username").unwrap_or_default();
        let Some(credential) = store.get(username) else {
            return Verdict::AuthRequired(DenyReason::UnknownUser(SmolStr::new(username)));
        };

        if !credential.allows_port(request.local_port) {
            return Verdict::AuthRequired(DenyReason::PortMismatch {
                username: SmolStr::new(username),
                local_port: request.local_port,
            });
        }

        let qop = auth.param("qop").unwrap_or_default();
        if qop != QOP_AUTH {
            return Verdict::ProtocolError(ProtocolViolation::UnsupportedQop(SmolStr::new(qop)));
        }

        let Some(response) = auth.param("response") else {
            return Verdict::ProtocolError(ProtocolViolation::MissingResponse);
        };

        let expected = request_digest(
            credential.digest_key(),
            nonce,
            auth.param("nc").unwrap_or_default(),
            auth.param("cnonce").unwrap_or_default(),
            request.method,
            auth.param("uri").unwrap_or(request.uri),
        );

        if bool::from(expected.as_bytes().ct_eq(response.as_bytes())) {
            Verdict::Accepted {
                username: SmolStr::new(username),
            }
        } else {
            Verdict::AuthRequired(DenyReason::DigestMismatch(SmolStr::new(username)))
        }
    }
}
