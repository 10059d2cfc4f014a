// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the warden proxy authentication gate.
//!
//! This crate holds the data model shared by the parser, the digest
//! verifier and the gate:
//! - **Networks**: [`NetworkRange`] pre-masked allowlist entries (IPv4/IPv6)
//! - **Credentials**: [`UserCredential`] and the unique-keyed [`CredentialStore`]
//! - **Headers**: [`ProxyAuthorization`] bounded scheme + parameter container
//! - **Errors**: [`ConfigError`] for fatal startup configuration problems
//! - **Hashing**: the fixed MD5 digest primitives in [`digest`]
//!
//! # Examples
//!
//! ```
//! use warden_core::{NetworkRange, UserCredential};
//!
//! let range = NetworkRange::new("10.0.0.0".parse().unwrap(), 8).unwrap();
//! assert!(range.contains(&"10.1.2.3".parse().unwrap()));
//!
//! let cred = UserCredential::new("alice", "secret", 0);
//! assert_eq!(cred.digest_key().len(), 32);
//! ```

pub mod auth;
pub mod credential;
pub mod digest;
pub mod error;
pub mod net;

pub use auth::{AuthorizationError, ProxyAuthorization};
pub use credential::{CredentialStore, UserCredential};
pub use error::ConfigError;
pub use net::NetworkRange;

/// Realm embedded in both the credential hash and the challenge header.
pub const REALM: &str = "warden proxy";

/// The only quality-of-protection value the gate implements.
pub const QOP_AUTH: &str = "auth";
