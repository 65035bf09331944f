// src/ingest/scheduler.rs
//! Refresh scheduling: "is a refresh due", plus a single-slot hand-off to one
//! background worker so at most one refresh is ever in flight.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_REFRESH_SECS: i64 = 3600;

/// A refresh is due once `interval` of wall-clock time has passed since the
/// last one, or if there never was one.
pub fn needs_refresh(last: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> bool {
    match last {
        None => true,
        Some(t) => now - t >= interval,
    }
}

/// Receiving end of the refresh hand-off; give it to `spawn_refresh_worker`.
pub struct RefreshRequests(mpsc::Receiver<()>);

#[derive(Debug)]
pub struct RefreshGate {
    in_flight: AtomicBool,
    last_refresh: Mutex<Option<DateTime<Utc>>>,
    interval: Duration,
    tx: mpsc::Sender<()>,
}

impl RefreshGate {
    pub fn new(interval: Duration) -> (Self, RefreshRequests) {
        let (tx, rx) = mpsc::channel(1);
        let gate = Self {
            in_flight: AtomicBool::new(false),
            last_refresh: Mutex::new(None),
            interval,
            tx,
        };
        (gate, RefreshRequests(rx))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.lock()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        needs_refresh(self.last_refresh(), now, self.interval)
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Claim the single refresh slot. `None` if a refresh is already running.
    pub fn try_begin(&self) -> Option<RefreshClaim<'_>> {
        self.claim().then_some(RefreshClaim { gate: self })
    }

    /// Take over a slot claimed by `request_if_due`; only the worker serving
    /// the request may call this.
    pub fn adopt(&self) -> RefreshClaim<'_> {
        RefreshClaim { gate: self }
    }

    /// Ask the background worker for a refresh if one is due and none is
    /// running. Returns whether a request was handed off.
    pub fn request_if_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_due(now) || !self.claim() {
            return false;
        }
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(e) => {
                // no worker listening (or slot somehow full): give the claim back
                tracing::debug!(target: "ingest", error = %e, "refresh hand-off failed");
                self.in_flight.store(false, Ordering::SeqCst);
                false
            }
        }
    }
}

/// Run `refresh` for every handed-off request. The slot is claimed by the
/// requester; `refresh` is expected to `adopt` it.
pub fn spawn_refresh_worker<F, Fut>(requests: RefreshRequests, refresh: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let RefreshRequests(mut rx) = requests;
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            refresh().await;
        }
        tracing::debug!(target: "ingest", "refresh worker stopped");
    })
}

/// The held refresh slot. Dropping it releases the slot, also when the
/// refresh panics.
#[must_use]
#[derive(Debug)]
pub struct RefreshClaim<'a> {
    gate: &'a RefreshGate,
}

impl RefreshClaim<'_> {
    /// Remember when the refresh ran.
    pub fn finish(&self, at: DateTime<Utc>) {
        *self.gate.last_refresh.lock() = Some(at);
    }
}

impl Drop for RefreshClaim<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Fire `tick` every `period`, starting after one period.
pub fn spawn_ticker<F>(period: std::time::Duration, tick: F) -> JoinHandle<()>
where
    F: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            tick();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn due_after_an_hour() {
        let t0 = Utc::now();
        let hour = Duration::seconds(DEFAULT_REFRESH_SECS);
        assert!(needs_refresh(None, t0, hour));
        assert!(!needs_refresh(Some(t0), t0 + Duration::minutes(59), hour));
        assert!(needs_refresh(Some(t0), t0 + Duration::minutes(60), hour));
    }

    #[test]
    fn only_one_claim_at_a_time() {
        let (gate, _rx) = RefreshGate::new(Duration::hours(1));
        let claim = gate.try_begin().expect("free slot");
        assert!(gate.try_begin().is_none());
        claim.finish(Utc::now());
        drop(claim);
        assert!(gate.try_begin().is_some());
        assert!(gate.last_refresh().is_some());
    }

    #[tokio::test]
    async fn panicking_refresh_releases_slot() {
        let (gate, _rx) = RefreshGate::new(Duration::hours(1));
        let gate = Arc::new(gate);
        let g = gate.clone();
        let res = tokio::spawn(async move {
            let _claim = g.try_begin().expect("free slot");
            panic!("provider blew up");
        })
        .await;
        assert!(res.is_err());
        assert!(!gate.in_flight());
        assert!(gate.last_refresh().is_none());
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn second_request_while_in_flight_is_a_noop() {
        let (gate, _rx) = RefreshGate::new(Duration::hours(1));
        let now = Utc::now();
        assert!(gate.request_if_due(now));
        assert!(!gate.request_if_due(now));
        let claim = gate.adopt();
        claim.finish(now);
        drop(claim);
        // not due any more
        assert!(!gate.request_if_due(now + Duration::minutes(5)));
    }

    #[test]
    fn request_without_worker_releases_claim() {
        let (gate, rx) = RefreshGate::new(Duration::hours(1));
        drop(rx);
        assert!(!gate.request_if_due(Utc::now()));
        assert!(!gate.in_flight());
    }

    #[tokio::test]
    async fn worker_runs_handed_off_refresh() {
        let (gate, rx) = RefreshGate::new(Duration::hours(1));
        let gate = Arc::new(gate);
        let runs = Arc::new(AtomicUsize::new(0));

        let (g, r) = (gate.clone(), runs.clone());
        let handle = spawn_refresh_worker(rx, move || {
            let (g, r) = (g.clone(), r.clone());
            async move {
                let claim = g.adopt();
                r.fetch_add(1, Ordering::SeqCst);
                claim.finish(Utc::now());
            }
        });

        assert!(gate.request_if_due(Utc::now()));
        for _ in 0..100 {
            if !gate.in_flight() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(gate.last_refresh().is_some());
        handle.abort();
    }
}
