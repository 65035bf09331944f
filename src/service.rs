// src/service.rs
//! # Mixer Service
//! The surface the HTTP layer talks to: refresh the pool, hand out pairings,
//! take votes, list the leaderboard.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;

use crate::config::MixerConfig;
use crate::error::MashupError;
use crate::headlines::{HeadlineRecord, HeadlineStore};
use crate::ingest::{
    self,
    scheduler::{self, RefreshClaim, RefreshGate, RefreshRequests},
    types::TeaserProvider,
};
use crate::matchmaker::{self, Pairing};
use crate::pairings::PairingStore;
use crate::snapshot::{self, SnapshotStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    fn label(self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
        }
    }
}

/// What one refresh cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshReport {
    /// Another refresh was already running; nothing was done.
    pub skipped: bool,
    pub fragments: usize,
    pub added: usize,
    pub known_urls: usize,
    pub evicted: usize,
    pub total: usize,
}

pub struct MixerService {
    headlines: Arc<HeadlineStore>,
    pairings: PairingStore,
    persister: Persister,
    providers: Vec<Box<dyn TeaserProvider>>,
    gate: RefreshGate,
}

// Writes the pool to the snapshot store. Copy and write happen under one
// lock, so the last write on disk is always the newest copy.
#[derive(Clone)]
struct Persister {
    headlines: Arc<HeadlineStore>,
    snapshot: Arc<dyn SnapshotStore>,
    lock: Arc<Mutex<()>>,
}

impl Persister {
    fn persist(&self) {
        let _g = self.lock.lock();
        let records = self.headlines.records();
        if let Err(e) = self.snapshot.save(&records) {
            let err = MashupError::from(e);
            tracing::warn!(error = %err, "continuing in memory");
        }
    }
}

impl MixerService {
    /// Build the service, seeding the pool from the snapshot (missing or
    /// corrupt snapshots start empty). The returned requests must be handed to
    /// `start_refresh_worker` for background refreshes to happen.
    pub fn new(
        cfg: &MixerConfig,
        snapshot: Arc<dyn SnapshotStore>,
        providers: Vec<Box<dyn TeaserProvider>>,
    ) -> (Self, RefreshRequests) {
        let records = snapshot::load_or_empty(snapshot.as_ref());
        tracing::info!(headlines = records.len(), "snapshot loaded");

        let (gate, requests) = RefreshGate::new(cfg.refresh_interval);
        let headlines = Arc::new(HeadlineStore::from_records(records, cfg.max_headlines));
        let svc = Self {
            persister: Persister {
                headlines: Arc::clone(&headlines),
                snapshot,
                lock: Arc::default(),
            },
            headlines,
            pairings: PairingStore::with_ttl(cfg.pairing_ttl),
            providers,
            gate,
        };
        (svc, requests)
    }

    pub fn headlines(&self) -> &HeadlineStore {
        &self.headlines
    }

    pub fn pairings(&self) -> &PairingStore {
        &self.pairings
    }

    pub fn gate(&self) -> &RefreshGate {
        &self.gate
    }

    /// Background worker that serves refresh requests made by `get_pairing`.
    pub fn start_refresh_worker(self: &Arc<Self>, requests: RefreshRequests) -> JoinHandle<()> {
        let svc = Arc::clone(self);
        scheduler::spawn_refresh_worker(requests, move || {
            let svc = Arc::clone(&svc);
            async move {
                let claim = svc.gate.adopt();
                if let Err(e) = svc.run_refresh(claim).await {
                    tracing::error!(target: "ingest", error = %e, "background refresh failed");
                }
            }
        })
    }

    /// Ticking task that requests a refresh whenever one is due, even without traffic.
    pub fn start_ticker(self: &Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        let svc = Arc::clone(self);
        scheduler::spawn_ticker(period, move || {
            svc.gate.request_if_due(Utc::now());
        })
    }

    /// Run a refresh cycle now, unless one is already running.
    ///
    /// Fails with `EmptyPoolAtStartup` if the pool was empty and the cycle
    /// found nothing.
    pub async fn refresh(&self) -> Result<RefreshReport, MashupError> {
        let Some(claim) = self.gate.try_begin() else {
            tracing::info!(target: "ingest", "refresh already in progress, skipping");
            return Ok(RefreshReport {
                skipped: true,
                ..RefreshReport::default()
            });
        };
        self.run_refresh(claim).await
    }

    // The slot is released when `claim` drops, including on panic.
    async fn run_refresh(&self, claim: RefreshClaim<'_>) -> Result<RefreshReport, MashupError> {
        let was_empty = self.headlines.is_empty();
        let fragments = ingest::collect(&self.providers).await;
        let n_fragments = fragments.len();
        let merged = self.headlines.merge(fragments);
        let now = Utc::now();
        claim.finish(now);
        drop(claim);

        let report = RefreshReport {
            skipped: false,
            fragments: n_fragments,
            added: merged.added,
            known_urls: merged.skipped_known_url,
            evicted: merged.evicted,
            total: merged.total,
        };

        counter!("mixer_refresh_total").increment(1);
        counter!("mixer_headlines_added_total").increment(report.added as u64);
        gauge!("mixer_pool_size").set(report.total as f64);
        gauge!("mixer_last_refresh_ts").set(now.timestamp() as f64);

        if report.added == 0 {
            if was_empty && self.headlines.is_empty() {
                tracing::error!(target: "ingest", "no headlines!");
                return Err(MashupError::EmptyPoolAtStartup);
            }
            tracing::warn!(target: "ingest", total = report.total, "no new headlines in update");
        } else {
            tracing::info!(
                target: "ingest",
                added = report.added,
                known_urls = report.known_urls,
                evicted = report.evicted,
                total = report.total,
                "headline pool refreshed"
            );
        }

        let persister = self.persister.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || persister.persist()).await {
            tracing::warn!(target: "ingest", error = %e, "snapshot write task failed");
        }
        Ok(report)
    }

    /// Request a refresh if due, then draw and register a new pairing.
    pub fn get_pairing<R: Rng>(&self, rng: &mut R) -> Result<Pairing, MashupError> {
        self.get_pairing_at(rng, Utc::now())
    }

    pub fn get_pairing_at<R: Rng>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Pairing, MashupError> {
        if self.gate.request_if_due(now) {
            tracing::debug!(target: "ingest", "refresh requested");
        }
        let pool = self.headlines.snapshot();
        let pairing = matchmaker::draw(&pool, rng, now)?;
        self.pairings.register_at(pairing.clone(), now);
        Ok(pairing)
    }

    pub fn vote_up(&self, token: &str) -> bool {
        self.vote_at(token, Vote::Up, Utc::now())
    }

    pub fn vote_down(&self, token: &str) -> bool {
        self.vote_at(token, Vote::Down, Utc::now())
    }

    /// Apply a vote to both headlines of a live pairing. `false` if the token
    /// is unknown or expired; nothing is changed then.
    pub fn vote_at(&self, token: &str, vote: Vote, now: DateTime<Utc>) -> bool {
        let Some(p) = self.pairings.resolve_at(token, now) else {
            tracing::debug!(target: "votes", direction = vote.label(), "unknown or expired token");
            return false;
        };
        match vote {
            Vote::Up => {
                p.first.vote_up();
                p.second.vote_up();
            }
            Vote::Down => {
                p.first.vote_down();
                p.second.vote_down();
            }
        }
        counter!("mixer_votes_total", "direction" => vote.label()).increment(1);
        tracing::info!(
            target: "votes",
            direction = vote.label(),
            first = %p.first.url,
            second = %p.second.url,
            "vote recorded"
        );
        self.persister.persist();
        true
    }

    /// Leaderboard: highest score first, ties in discovery order.
    pub fn top_headlines(&self, n: usize) -> Vec<HeadlineRecord> {
        self.headlines.top(n)
    }
}
