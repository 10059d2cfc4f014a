// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed digest primitives (MD5, `qop=auth`, RFC 2617 §3.2.2.1).

use crate::QOP_AUTH;

/// Lowercase hex MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// H(username:realm:password), the per-credential digest key (HA1).
pub fn digest_key(username: &str, realm: &str, password: &str) -> String {
    md5_hex(format!("{}:{}:{}", username, realm, password).as_bytes())
}

/// Request-digest for `qop=auth`:
/// `H(HA1:nonce:nc:cnonce:auth:H(method:uri))`.
pub fn request_digest(
    digest_key: &str,
    nonce: &str,
    nc: &str,
    cnonce: &str,
    method: &str,
    uri: &str,
) -> String {
    let ha2 = md5_hex(format!("{}:{}", method, uri).as_bytes());
    let input = format!(
        "{}:{}:{}:{}:{}:{}",
        digest_key, nonce, nc, cnonce, QOP_AUTH, ha2
    );
    md5_hex(input.as_bytes())
}
