// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client side of the handshake: read a 407 and answer it.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use smol_str::SmolStr;
use warden_core::digest::{digest_key, request_digest};
use warden_core::{AuthorizationError, ProxyAuthorization, QOP_AUTH};
use warden_parse::parse_proxy_authorization;

/// Parameters of a `Proxy-Authenticate: Digest` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub realm: SmolStr,
    pub nonce: SmolStr,
    pub qop: Option<SmolStr>,
}

/// Parses a `Proxy-Authenticate` header value.
///
/// Returns `None` for non-Digest schemes or when `realm` or `nonce` is absent.
pub fn parse_challenge(value: &str) -> Option<Challenge> {
    let parsed = parse_proxy_authorization(value).ok()?;
    if !parsed.is_digest() {
        return None;
    }
    Some(Challenge {
        realm: SmolStr::new(parsed.param("realm")?),
        nonce: SmolStr::new(parsed.param("nonce")?),
        qop: parsed.param("qop").map(SmolStr::new),
    })
}

/// Extracts the challenge from a raw 407 response.
pub fn challenge_from_response(response: &[u8]) -> Option<Challenge> {
    let text = std::str::from_utf8(response).ok()?;
    let (head, _) = text.split_once("\r\n\r\n").unwrap_or((text, ""));
    head.lines().skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("proxy-authenticate") {
            parse_challenge(value.trim())
        } else {
            None
        }
    })
}

/// Builds `Proxy-Authorization` values for one set of credentials.
pub struct DigestClient {
    pub username: SmolStr,
    pub password: SmolStr,
    pub nc: u32,
}

impl DigestClient {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: SmolStr::new(username),
            password: SmolStr::new(password),
            nc: 0,
        }
    }

    /// Answers `challenge` for `method uri` with a random client nonce.
    pub fn generate_authorization(
        &mut self,
        challenge: &Challenge,
        method: &str,
        uri: &str,
    ) -> Result<String, AuthorizationError> {
        let cnonce: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        self.authorization_with_cnonce(challenge, method, uri, &cnonce)
    }

    /// Same as [`generate_authorization`](Self::generate_authorization) with a
    /// caller-chosen client nonce.
    pub fn authorization_with_cnonce(
        &mut self,
        challenge: &Challenge,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> Result<String, AuthorizationError> {
        self.nc += 1;
        let nc = format!("{:08x}", self.nc);
        let ha1 = digest_key(&self.username, &challenge.realm, &self.password);
        let response = request_digest(&ha1, &challenge.nonce, &nc, cnonce, method, uri);

        let mut auth = ProxyAuthorization::new("Digest")?;
        auth.add_param("username", self.username.clone())?;
        auth.add_param("realm", challenge.realm.clone())?;
        auth.add_param("nonce", challenge.nonce.clone())?;
        auth.add_param("uri", uri)?;
        auth.add_param("qop", QOP_AUTH)?;
        auth.add_param("nc", nc)?;
        auth.add_param("cnonce", cnonce)?;
        auth.add_param("response", response)?;
        Ok(auth.to_string())
    }
}
