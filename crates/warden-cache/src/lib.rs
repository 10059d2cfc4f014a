// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expiring membership set for already-authenticated clients.
//!
//! Entries expire a fixed duration after insertion. Expiry is enforced on
//! access, so [`TtlSet::has`] never reports a key past its deadline even if
//! no sweep has run; [`TtlSet::purge_expired`] and [`spawn_sweeper`] reclaim
//! memory for keys that are never looked up again.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use warden_cache::{ClientCache, TtlSet};
//!
//! let authed = TtlSet::new(Duration::from_secs(2 * 3600));
//! authed.add("192.168.1.100");
//! assert!(authed.has("192.168.1.100"));
//! assert!(!authed.has("192.168.1.101"));
//! ```

use dashmap::DashMap;
use smol_str::SmolStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// Membership test and insert for authenticated client keys.
///
/// Implementations synchronise internally; the gate calls both methods from
/// many connection tasks at once.
pub trait ClientCache: Send + Sync {
    fn has(&self, key: &str) -> bool;
    fn add(&self, key: &str);
}

/// Thread-safe set whose entries expire `ttl` after insertion.
#[derive(Debug, Clone)]
pub struct TtlSet {
    ttl: Duration,
    entries: Arc<DashMap<SmolStr, Instant>>,
}

impl TtlSet {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether `key` was added less than `ttl` ago. Expired keys are evicted.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(deadline) if now < *deadline => return true,
            Some(_) => true,
            None => false,
        };
        if expired {
            // Re-check under the write lock: a concurrent add may have refreshed it.
            self.entries.remove_if(key, |_, deadline| now >= *deadline);
            debug!(key, "authenticated entry expired");
        }
        false
    }

    /// Inserts `key`, restarting its expiry if already present.
    pub fn add(&self, key: &str) {
        let deadline = Instant::now() + self.ttl;
        self.entries.insert(SmolStr::new(key), deadline);
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, deadline| {
            if now >= *deadline {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            debug!(removed, "purged expired authenticated clients");
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClientCache for TtlSet {
    fn has(&self, key: &str) -> bool {
        TtlSet::has(self, key)
    }

    fn add(&self, key: &str) {
        TtlSet::add(self, key)
    }
}

/// Runs [`TtlSet::purge_expired`] every `interval` on the current tokio runtime.
pub fn spawn_sweeper(set: TtlSet, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            set.purge_expired();
        }
    })
}
