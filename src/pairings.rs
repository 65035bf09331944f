// src/pairings.rs
//! # Pairing Store
//! Live pairings keyed by vote token, expiring after a fixed TTL.
//!
//! Expiry is lazy: every `register`/`resolve` sweeps out entries older than
//! the TTL. There is no background timer, so an idle store holds on to stale
//! entries until the next call touches it.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::matchmaker::Pairing;

pub const DEFAULT_TTL_SECS: i64 = 2 * 3600;

#[derive(Debug)]
pub struct PairingStore {
    inner: Mutex<HashMap<String, Pairing>>,
    ttl: Duration,
}

impl Default for PairingStore {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl PairingStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, p: &Pairing, now: DateTime<Utc>) -> bool {
        now - p.created_at > self.ttl
    }

    fn sweep(&self, map: &mut HashMap<String, Pairing>, now: DateTime<Utc>) {
        let before = map.len();
        map.retain(|_, p| !self.is_expired(p, now));
        let evicted = before - map.len();
        if evicted > 0 {
            tracing::debug!(target: "votes", evicted, "expired pairings swept");
        }
    }

    pub fn register(&self, pairing: Pairing) {
        self.register_at(pairing, Utc::now());
    }

    pub fn register_at(&self, pairing: Pairing, now: DateTime<Utc>) {
        let mut map = self.inner.lock();
        self.sweep(&mut map, now);
        map.insert(pairing.token.clone(), pairing);
    }

    /// Look up a live pairing by token.
    pub fn resolve(&self, token: &str) -> Option<Pairing> {
        self.resolve_at(token, Utc::now())
    }

    pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<Pairing> {
        let mut map = self.inner.lock();
        self.sweep(&mut map, now);
        map.get(token).cloned()
    }

    /// Number of entries held, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
