// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use warden_auth::{AuthConfig, AuthPath, GateDecision, GateState, Rejection};
use warden_cache::{ClientCache, TtlSet};
use warden_testkit::{
    answer_challenge, build_connect, build_gate, build_get, fetch_challenge, handshake,
    header_value, single_user, MockConn,
};

/// A client with no credentials is challenged, answers, and is let through.
#[tokio::test]
async fn full_handshake_on_one_connection() {
    let gate = build_gate(single_user("alice:secret"));
    let mut conn = MockConn::new("198.51.100.4:40000", 8080);
    let request = build_connect("example.com:443");

    let decision = handshake(&gate, &mut conn, &request, "alice", "secret").await;
    assert_eq!(decision, GateDecision::Authenticated(AuthPath::Digest));
    // Only the challenge was written.
    assert_eq!(conn.writes().len(), 1);
    assert_eq!(conn.last_status(), Some(407));
}

#[tokio::test]
async fn challenge_headers() {
    let gate = build_gate(single_user("alice:secret"));
    let mut conn = MockConn::new("198.51.100.4:40000", 8080);
    let challenge = fetch_challenge(&gate, &mut conn, &build_get("http://example.com/"))
        .await
        .expect("407 with challenge");

    assert_eq!(challenge.realm, "warden proxy");
    assert_eq!(challenge.qop.as_deref(), Some("auth"));
    assert!(u64::from_str_radix(&challenge.nonce, 16).is_ok());

    let response = conn.last_response();
    assert_eq!(
        header_value(&response, "Cache-Control").as_deref(),
        Some("no-cache")
    );
    assert_eq!(
        header_value(&response, "Content-Type").as_deref(),
        Some("text/html")
    );
}

#[tokio::test]
async fn wrong_password_keeps_connection_open() {
    let gate = build_gate(single_user("alice:secret"));
    let mut conn = MockConn::new("198.51.100.4:40000", 8080);
    let request = build_connect("example.com:443");

    let decision = handshake(&gate, &mut conn, &request, "alice", "guess").await;
    assert_eq!(decision, GateDecision::ChallengeIssued);
    assert_eq!(decision.state(), GateState::ChallengeIssued);
    assert!(!decision.should_close());
    assert_eq!(conn.writes().len(), 2);

    // The retry on the same connection succeeds.
    let decision = handshake(&gate, &mut conn, &request, "alice", "secret").await;
    assert!(decision.is_authenticated());
}

#[tokio::test]
async fn unknown_user_looks_like_wrong_password() {
    let gate = build_gate(single_user("alice:secret"));
    let request = build_connect("example.com:443");

    let mut unknown = MockConn::new("198.51.100.4:40000", 8080);
    handshake(&gate, &mut unknown, &request, "mallory", "secret").await;
    let mut wrong = MockConn::new("198.51.100.5:40000", 8080);
    handshake(&gate, &mut wrong, &request, "alice", "guess").await;

    // Both final responses are 407s that differ only by nonce.
    let strip_nonce = |s: &str| -> String { s.split("nonce=").next().unwrap_or("").to_owned() };
    assert_eq!(unknown.last_status(), Some(407));
    assert_eq!(
        strip_nonce(&unknown.last_response()),
        strip_nonce(&wrong.last_response())
    );
}

#[tokio::test]
async fn cached_client_skips_handshake_until_expiry() {
    let cache = TtlSet::new(Duration::from_millis(50));
    let gate = build_gate(single_user("alice:secret").cache(Arc::new(cache.clone())));
    let request = build_get("http://example.com/");

    let mut first = MockConn::new("203.0.113.9:5000", 8080);
    assert!(handshake(&gate, &mut first, &request, "alice", "secret")
        .await
        .is_authenticated());
    assert!(cache.has("203.0.113.9"));

    let mut second = MockConn::new("203.0.113.9:5001", 8080);
    let garbage = request.clone().with_proxy_authorization("garbage");
    assert_eq!(
        gate.authenticate(&mut second, &garbage).await,
        GateDecision::Authenticated(AuthPath::Cached)
    );
    assert!(second.writes().is_empty());

    tokio::time::sleep(Duration::from_millis(80)).await;
    let mut third = MockConn::new("203.0.113.9:5002", 8080);
    assert_eq!(
        gate.authenticate(&mut third, &request).await,
        GateDecision::ChallengeIssued
    );
}

#[tokio::test]
async fn cache_is_keyed_by_ip_only() {
    let gate = build_gate(single_user("alice:secret"));
    let request = build_get("http://example.com/");
    let mut conn = MockConn::new("203.0.113.9:5000", 8080);
    handshake(&gate, &mut conn, &request, "alice", "secret").await;

    let mut other = MockConn::new("203.0.113.10:5000", 8080);
    assert_eq!(
        gate.authenticate(&mut other, &request).await,
        GateDecision::ChallengeIssued
    );
}

#[tokio::test]
async fn allowlisted_networks() {
    let gate = build_gate(
        AuthConfig::builder()
            .user_passwd("alice:secret")
            .allowed_client("10.0.0.0/8, 192.168.1.5, 2001:db8::/32"),
    );
    let request = build_connect("example.com:443");

    for client in ["10.1.2.3:1", "192.168.1.5:1", "[2001:db8::7]:1"] {
        let mut conn = MockConn::new(client, 8080);
        assert_eq!(
            gate.authenticate(&mut conn, &request).await,
            GateDecision::Authenticated(AuthPath::Allowlisted),
            "{}",
            client
        );
        assert!(conn.writes().is_empty());
    }

    for client in ["11.0.0.0:1", "192.168.1.6:1", "[2001:db9::7]:1"] {
        let mut conn = MockConn::new(client, 8080);
        assert_eq!(
            gate.authenticate(&mut conn, &request).await,
            GateDecision::ChallengeIssued,
            "{}",
            client
        );
    }
}

#[tokio::test]
async fn protocol_errors_close_with_generic_400() {
    let gate = build_gate(single_user("alice:secret"));
    let request = build_get("http://example.com/");

    for header in [
        "Basic YWxpY2U6c2VjcmV0",
        "Digest",
        "Digest username=\"alice\", nonce=\"not-a-timestamp\"",
    ] {
        let mut conn = MockConn::new("198.51.100.4:40000", 8080);
        let decision = gate
            .authenticate(&mut conn, &request.clone().with_proxy_authorization(header))
            .await;
        assert_eq!(decision, GateDecision::Rejected(Rejection::Protocol), "{}", header);
        assert!(decision.should_close());
        let response = conn.last_response();
        assert_eq!(conn.last_status(), Some(400));
        assert_eq!(
            header_value(&response, "Connection").as_deref(),
            Some("close")
        );
        assert!(!response.contains("not-a-timestamp"));
    }
}

/// An empty `Proxy-Authorization` is answered like a missing one.
#[tokio::test]
async fn empty_header_is_challenged_not_rejected() {
    let gate = build_gate(single_user("alice:secret"));
    let mut conn = MockConn::new("198.51.100.4:40000", 8080);
    let request = build_connect("example.com:443");

    let decision = gate
        .authenticate(&mut conn, &request.clone().with_proxy_authorization(""))
        .await;
    assert_eq!(decision, GateDecision::ChallengeIssued);
    assert!(!decision.should_close());
    assert_eq!(conn.last_status(), Some(407));

    // The client can still finish the handshake on the same connection.
    let challenge = conn.last_challenge().unwrap();
    let answered = answer_challenge(&request, &challenge, "alice", "secret");
    assert_eq!(
        gate.authenticate(&mut conn, &answered).await,
        GateDecision::Authenticated(AuthPath::Digest)
    );
}

#[tokio::test]
async fn oversized_answer_closes_with_400() {
    let gate = build_gate(single_user("alice:secret"));
    let mut conn = MockConn::new("198.51.100.4:40000", 8080);
    let request = build_connect("example.com:443");
    let challenge = fetch_challenge(&gate, &mut conn, &request).await.unwrap();

    let answered = answer_challenge(&request, &challenge, "alice", "secret");
    let header = format!(
        "{}, opaque=\"{}\"",
        answered.proxy_authorization.as_deref().unwrap(),
        "o".repeat(4096)
    );
    let decision = gate
        .authenticate(&mut conn, &request.with_proxy_authorization(header))
        .await;
    assert_eq!(decision, GateDecision::Rejected(Rejection::Protocol));
    assert_eq!(conn.last_status(), Some(400));
}

#[tokio::test]
async fn auth_int_answer_is_rejected() {
    let gate = build_gate(single_user("alice:secret"));
    let mut conn = MockConn::new("198.51.100.4:40000", 8080);
    let request = build_connect("example.com:443");
    let challenge = fetch_challenge(&gate, &mut conn, &request).await.unwrap();

    let answered = answer_challenge(&request, &challenge, "alice", "secret");
    let header = answered
        .proxy_authorization
        .as_deref()
        .unwrap()
        .replace("qop=auth", "qop=auth-int");
    let decision = gate
        .authenticate(&mut conn, &request.with_proxy_authorization(header))
        .await;
    assert_eq!(decision, GateDecision::Rejected(Rejection::Protocol));
}

#[tokio::test]
async fn port_bound_credentials() {
    let gate = build_gate(single_user("bob:pw:3128"));
    let request = build_connect("example.com:443");

    let mut wrong = MockConn::new("198.51.100.4:40000", 8080);
    assert_eq!(
        handshake(&gate, &mut wrong, &request, "bob", "pw").await,
        GateDecision::ChallengeIssued
    );

    let mut right = MockConn::new("198.51.100.4:40001", 3128);
    assert_eq!(
        handshake(&gate, &mut right, &request, "bob", "pw").await,
        GateDecision::Authenticated(AuthPath::Digest)
    );
}

#[tokio::test]
async fn broken_connection_is_internal_rejection() {
    let gate = build_gate(single_user("alice:secret"));
    let mut conn = MockConn::broken("198.51.100.4:40000", 8080);
    let decision = gate
        .authenticate(&mut conn, &build_get("http://example.com/"))
        .await;
    assert_eq!(decision, GateDecision::Rejected(Rejection::Internal));
}

#[tokio::test]
async fn unconfigured_gate_is_open() {
    let gate = build_gate(AuthConfig::builder());
    let mut conn = MockConn::new("198.51.100.4:40000", 8080);
    let request = build_get("http://example.com/").with_proxy_authorization("garbage");
    assert_eq!(
        gate.authenticate(&mut conn, &request).await,
        GateDecision::Authenticated(AuthPath::Open)
    );
}

proptest! {
    #[test]
    fn any_ipv4_in_allowed_network_passes(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let gate = build_gate(
            AuthConfig::builder()
                .user_passwd("alice:secret")
                .allowed_client("10.0.0.0/8"),
        );
        let mut conn = MockConn::new(&format!("10.{}.{}.{}:1000", a, b, c), 8080);
        let decision = runtime.block_on(gate.authenticate(&mut conn, &build_get("http://x/")));
        prop_assert_eq!(decision, GateDecision::Authenticated(AuthPath::Allowlisted));
    }
}
