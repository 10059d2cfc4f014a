// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test harness for the authentication gate.
//!
//! Provides an in-memory connection that records what the gate writes,
//! request builders, and helpers that answer a recorded challenge.
//!
//! # Example
//! ```
//! use warden_testkit::{build_connect, MockConn};
//! let conn = MockConn::new("198.51.100.4:40000", 8080);
//! let req = build_connect("example.com:443");
//! assert_eq!(req.method, "CONNECT");
//! assert!(conn.writes().is_empty());
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use smol_str::SmolStr;
use warden_auth::{
    challenge_from_response, AuthConfig, AuthConfigBuilder, AuthGate, Challenge, ClientConn,
    DigestClient, ProxyRequest,
};

/// In-memory [`ClientConn`] that records every response written to it.
#[derive(Debug, Clone)]
pub struct MockConn {
    remote: SocketAddr,
    local: SocketAddr,
    writes: Vec<Bytes>,
    fail_writes: bool,
}

impl MockConn {
    /// A connection from `remote` (an `ip:port` string) to local port `local_port`.
    pub fn new(remote: &str, local_port: u16) -> Self {
        Self {
            remote: remote.parse().unwrap(),
            local: SocketAddr::from(([127, 0, 0, 1], local_port)),
            writes: Vec::new(),
            fail_writes: false,
        }
    }

    /// A connection whose writes all fail with `BrokenPipe`.
    pub fn broken(remote: &str, local_port: u16) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(remote, local_port)
        }
    }

    pub fn writes(&self) -> &[Bytes] {
        &self.writes
    }

    pub fn last_write(&self) -> Option<&Bytes> {
        self.writes.last()
    }

    /// The last write as text, or an empty string.
    pub fn last_response(&self) -> String {
        self.last_write()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Status code of the last write.
    pub fn last_status(&self) -> Option<u16> {
        let response = self.last_response();
        response.split(' ').nth(1)?.parse().ok()
    }

    /// The challenge carried by the last write, if it was a 407.
    pub fn last_challenge(&self) -> Option<Challenge> {
        challenge_from_response(self.last_write()?)
    }
}

#[async_trait]
impl ClientConn for MockConn {
    fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    fn local_addr(&self) -> SocketAddr {
        self.local
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock connection closed"));
        }
        self.writes.push(Bytes::copy_from_slice(data));
        Ok(())
    }
}

/// Builds a gate from a configured builder.
pub fn build_gate(builder: AuthConfigBuilder) -> AuthGate {
    AuthGate::new(Arc::new(builder.build().unwrap()))
}

/// Constructs a `CONNECT` tunnel request for `authority`.
pub fn build_connect(authority: &str) -> ProxyRequest {
    ProxyRequest::new("CONNECT", authority)
}

/// Constructs an absolute-form `GET` request.
pub fn build_get(uri: &str) -> ProxyRequest {
    ProxyRequest::new("GET", uri)
}

/// Copies `request` with a `Proxy-Authorization` answering `challenge`.
pub fn answer_challenge(
    request: &ProxyRequest,
    challenge: &Challenge,
    username: &str,
    password: &str,
) -> ProxyRequest {
    let mut client = DigestClient::new(username, password);
    let header = client
        .generate_authorization(challenge, &request.method, &request.uri)
        .unwrap();
    request.clone().with_proxy_authorization(header)
}

/// First leg of a handshake: sends `request` without credentials and
/// returns the challenge the gate wrote back.
pub async fn fetch_challenge(
    gate: &AuthGate,
    conn: &mut MockConn,
    request: &ProxyRequest,
) -> Option<Challenge> {
    let bare = ProxyRequest {
        proxy_authorization: None,
        ..request.clone()
    };
    gate.authenticate(conn, &bare).await;
    conn.last_challenge()
}

/// Full handshake on one connection: challenge, then answer.
pub async fn handshake(
    gate: &AuthGate,
    conn: &mut MockConn,
    request: &ProxyRequest,
    username: &str,
    password: &str,
) -> warden_auth::GateDecision {
    let Some(challenge) = fetch_challenge(gate, conn, request).await else {
        return gate.authenticate(conn, request).await;
    };
    let answered = answer_challenge(request, &challenge, username, password);
    gate.authenticate(conn, &answered).await
}

/// Config with one user and no allowlist.
pub fn single_user(entry: &str) -> AuthConfigBuilder {
    AuthConfig::builder().user_passwd(entry)
}

/// Value of a header in a raw response.
pub fn header_value(response: &str, name: &str) -> Option<SmolStr> {
    let (head, _) = response.split_once("\r\n\r\n").unwrap_or((response, ""));
    head.lines().skip(1).find_map(|line| {
        let (n, v) = line.split_once(':')?;
        n.trim()
            .eq_ignore_ascii_case(name)
            .then(|| SmolStr::new(v.trim()))
    })
}
