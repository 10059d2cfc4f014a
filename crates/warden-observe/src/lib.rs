// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observability hooks for authentication decisions.
//!
//! The gate reports every decision to a process-wide [`AuthMetrics`] sink.
//! Nothing is recorded until a sink is installed.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use warden_observe::{set_auth_metrics, TracingAuthMetrics};
//! set_auth_metrics(Arc::new(TracingAuthMetrics));
//! // Decisions now emitted via tracing events
//! ```

use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Metrics sink for gate outcomes.
///
/// `path` and `kind` are low-cardinality identifiers ("cached", "allowlist",
/// "digest", "protocol"); client addresses and usernames are never passed.
pub trait AuthMetrics: Send + Sync + 'static {
    fn on_authenticated(&self, path: &str);
    fn on_challenge(&self);
    fn on_rejected(&self, kind: &str);
}

#[derive(Debug, Default)]
struct NoopAuthMetrics;

impl AuthMetrics for NoopAuthMetrics {
    fn on_authenticated(&self, _path: &str) {}
    fn on_challenge(&self) {}
    fn on_rejected(&self, _kind: &str) {}
}

static AUTH_METRICS: OnceCell<Arc<dyn AuthMetrics>> = OnceCell::new();
static NOOP_AUTH_METRICS: NoopAuthMetrics = NoopAuthMetrics;

/// Installs the global metrics implementation.
///
/// Returns `true` if the sink was installed, or `false` if one was already set.
pub fn set_auth_metrics(metrics: Arc<dyn AuthMetrics>) -> bool {
    AUTH_METRICS.set(metrics).is_ok()
}

/// Returns the configured metrics sink, or a no-op sink.
pub fn auth_metrics() -> &'static dyn AuthMetrics {
    AUTH_METRICS
        .get()
        .map(|arc| arc.as_ref())
        .unwrap_or(&NOOP_AUTH_METRICS)
}

/// Metrics implementation that logs via `tracing`.
#[derive(Debug, Default)]
pub struct TracingAuthMetrics;

impl AuthMetrics for TracingAuthMetrics {
    fn on_authenticated(&self, path: &str) {
        tracing::debug!(path, "client authenticated");
    }

    fn on_challenge(&self) {
        tracing::debug!("digest challenge issued");
    }

    fn on_rejected(&self, kind: &str) {
        tracing::warn!(kind, "client rejected");
    }
}
