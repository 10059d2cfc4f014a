// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Digest authentication gate for forward proxies.
//!
//! [`AuthGate`] decides, per request, whether a client may use the proxy:
//! recently authenticated clients and allowlisted networks pass straight
//! through, everyone else completes an RFC 2617 Digest handshake
//! (MD5, `qop=auth`) against the configured credentials.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use warden_auth::{AuthConfig, AuthGate};
//!
//! let config = AuthConfig::builder()
//!     .user_passwd("alice:secret")
//!     .allowed_client("10.0.0.0/8")
//!     .build()
//!     .unwrap();
//! let gate = AuthGate::new(Arc::new(config));
//! assert!(gate.config().required());
//! ```

pub mod challenge;
pub mod client;
pub mod config;
pub mod digest;
pub mod gate;
pub mod nonce;

pub use challenge::{bad_request_page, ChallengeTemplate};
pub use client::{challenge_from_response, parse_challenge, Challenge, DigestClient};
pub use config::{load_credential_file, AuthConfig, AuthConfigBuilder, DEFAULT_AUTH_TIMEOUT};
pub use digest::{DenyReason, DigestRequest, DigestVerifier, ProtocolViolation, Verdict};
pub use gate::{
    AuthGate, AuthPath, ClientConn, GateDecision, GateState, ProxyRequest, Rejection,
};
pub use nonce::{Freshness, NonceService, DEFAULT_NONCE_MAX_AGE};
