// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stateless, time-derived nonces.
//!
//! A nonce is the issuing Unix time in seconds, rendered as lowercase hex.
//! Nothing is stored server-side: freshness is recovered by decoding the
//! value the client echoes back, so any instance can validate a nonce issued
//! by any other, and restarts lose nothing. Replays are only bounded by the
//! freshness window.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Reference freshness window.
pub const DEFAULT_NONCE_MAX_AGE: Duration = Duration::from_secs(60);

/// Outcome of decoding a client-returned nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Decoded, but issued longer ago than the window allows.
    Stale,
    /// Not a hex timestamp.
    Invalid,
}

/// Issues and validates nonces against a fixed freshness window.
#[derive(Debug, Clone, Copy)]
pub struct NonceService {
    max_age: Duration,
}

impl NonceService {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// A nonce for the current time.
    pub fn generate(&self) -> String {
        generate_at(SystemTime::now())
    }

    /// Checks a client-returned nonce against the current time.
    pub fn validate(&self, nonce: &str) -> Freshness {
        validate_freshness_at(nonce, self.max_age, SystemTime::now())
    }
}

impl Default for NonceService {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_MAX_AGE)
    }
}

/// Hex encoding of `now` in whole seconds since the Unix epoch.
pub fn generate_at(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{:x}", secs)
}

/// Decodes a nonce back into its Unix timestamp.
pub fn decode(nonce: &str) -> Option<i64> {
    i64::from_str_radix(nonce, 16).ok()
}

/// Freshness of `nonce` relative to the current time.
pub fn validate_freshness(nonce: &str, max_age: Duration) -> Freshness {
    validate_freshness_at(nonce, max_age, SystemTime::now())
}

/// Freshness of `nonce` relative to `now`.
///
/// A nonce is stale when more than `max_age` has elapsed since its timestamp.
/// Timestamps ahead of `now` count as fresh.
pub fn validate_freshness_at(nonce: &str, max_age: Duration, now: SystemTime) -> Freshness {
    let Some(secs) = decode(nonce) else {
        return Freshness::Invalid;
    };
    if secs < 0 {
        return Freshness::Stale;
    }
    let Some(issued) = UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64)) else {
        return Freshness::Fresh;
    };
    match now.duration_since(issued) {
        Ok(elapsed) if elapsed > max_age => Freshness::Stale,
        _ => Freshness::Fresh,
    }
}
