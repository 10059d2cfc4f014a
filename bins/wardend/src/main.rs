mod config;
mod conn;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::EnvFilter;
use warden_auth::{bad_request_page, AuthGate, ClientConn, GateDecision};
use warden_cache::{spawn_sweeper, TtlSet};
use warden_observe::{set_auth_metrics, TracingAuthMetrics};

use crate::config::{Args, Settings};
use crate::conn::{parse_head, TcpConn};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";

#[tokio::main]
/// Entry point for the authentication gate demo daemon.
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
    set_auth_metrics(Arc::new(TracingAuthMetrics));

    let settings = Settings::from_args(Args::parse())?;

    let cache = TtlSet::new(settings.auth_timeout);
    let config = settings
        .auth_config(Arc::new(cache.clone()))
        .build()
        .context("invalid authentication settings")?;
    let _sweeper = spawn_sweeper(cache, SWEEP_INTERVAL);
    let gate = Arc::new(AuthGate::new(Arc::new(config)));

    let listener = TcpListener::bind(&settings.listen)
        .await
        .with_context(|| format!("binding {}", settings.listen))?;
    info!(
        listen = %settings.listen,
        required = gate.config().required(),
        users = gate.config().users().len(),
        "listening (tcp)"
    );

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(%e, "tcp accept error");
                continue;
            }
        };
        tokio::spawn(handle_connection(Arc::clone(&gate), stream, peer));
    }
}

/// Serves one client until it disconnects or is rejected.
#[instrument(name = "connection", skip_all, fields(peer = %peer))]
async fn handle_connection(gate: Arc<AuthGate>, stream: TcpStream, peer: SocketAddr) {
    let mut conn = match TcpConn::new(stream, peer) {
        Ok(conn) => conn,
        Err(e) => {
            warn!(%e, "failed to read local address");
            return;
        }
    };

    loop {
        let head = match conn.read_head().await {
            Ok(Some(head)) => head,
            Ok(None) => {
                debug!("client closed connection");
                return;
            }
            Err(e) => {
                warn!(%e, "read error");
                return;
            }
        };

        let Some(request) = parse_head(&head) else {
            warn!("unparsable request head");
            if let Err(e) = conn.write_all(&bad_request_page()).await {
                debug!(%e, "failed to send 400 response");
            }
            return;
        };

        match gate.authenticate(&mut conn, &request).await {
            GateDecision::Authenticated(path) => {
                debug!(%path, method = %request.method, uri = %request.uri, "request allowed");
                if let Err(e) = conn.write_all(OK_RESPONSE).await {
                    warn!(%e, "write error");
                    return;
                }
            }
            GateDecision::ChallengeIssued => continue,
            GateDecision::Rejected(kind) => {
                debug!(kind = kind.as_str(), "closing connection");
                return;
            }
        }
    }
}
