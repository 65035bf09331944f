// src/headlines.rs
//! # Headline Store
//! The pool of headline fragments the mixer draws from.
//!
//! Readers get a consistent `Arc` snapshot of the pool; refresh merges are
//! built off to the side and published with a single atomic swap. Scores are
//! atomics on the shared `Headline`, so votes never need the writer lock.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::segment::Fragment;

/// A single headline fragment with its vote tally.
#[derive(Debug)]
pub struct Headline {
    pub text: String,
    pub url: String,
    score: AtomicI64,
}

impl Headline {
    pub fn new(text: impl Into<String>, url: impl Into<String>, score: i64) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
            score: AtomicI64::new(score),
        }
    }

    pub fn score(&self) -> i64 {
        self.score.load(Ordering::SeqCst)
    }

    pub fn vote_up(&self) {
        self.score.fetch_add(1, Ordering::SeqCst);
    }

    pub fn vote_down(&self) {
        self.score.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn to_record(&self) -> HeadlineRecord {
        HeadlineRecord {
            text: self.text.clone(),
            url: self.url.clone(),
            score: self.score(),
        }
    }
}

/// Plain, serializable copy of a headline (snapshot + leaderboard shape).
///
/// Older snapshots used `Headline`/`URL`/`Points`; those names are accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineRecord {
    #[serde(alias = "Headline")]
    pub text: String,
    #[serde(alias = "URL")]
    pub url: String,
    #[serde(default, alias = "Points")]
    pub score: i64,
}

impl From<HeadlineRecord> for Headline {
    fn from(r: HeadlineRecord) -> Self {
        Headline::new(r.text, r.url, r.score)
    }
}

/// Result of merging one refresh cycle into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub added: usize,
    pub skipped_known_url: usize,
    pub evicted: usize,
    pub total: usize,
}

pub type Pool = Arc<Vec<Arc<Headline>>>;

#[derive(Debug)]
pub struct HeadlineStore {
    pool: ArcSwap<Vec<Arc<Headline>>>,
    writer: Mutex<()>,
    /// 0 = unbounded.
    max_len: usize,
}

impl Default for HeadlineStore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HeadlineStore {
    pub fn new(max_len: usize) -> Self {
        Self {
            pool: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
            max_len,
        }
    }

    /// Build a store from persisted records, skipping blank ones.
    pub fn from_records(records: Vec<HeadlineRecord>, max_len: usize) -> Self {
        let store = Self::new(max_len);
        store.pool.store(Arc::new(
            records
                .into_iter()
                .filter(|r| !r.text.is_empty())
                .map(|r| Arc::new(Headline::from(r)))
                .collect(),
        ));
        store
    }

    /// Current pool; stays valid even if a refresh publishes a new one.
    pub fn snapshot(&self) -> Pool {
        self.pool.load_full()
    }

    pub fn len(&self) -> usize {
        self.pool.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.pool.load().iter().any(|h| h.url == url)
    }

    pub fn distinct_sources(&self) -> usize {
        distinct_sources(&self.pool.load())
    }

    /// Append fragments whose URL is not already live in the pool.
    ///
    /// Several fragments from the same (new) URL are all kept: one teaser
    /// usually produces more than one fragment.
    pub fn merge(&self, fragments: Vec<Fragment>) -> MergeOutcome {
        let _w = self.writer.lock();
        let current = self.pool.load_full();
        let known: HashSet<&str> = current.iter().map(|h| h.url.as_str()).collect();

        let mut next: Vec<Arc<Headline>> = Vec::with_capacity(current.len() + fragments.len());
        next.extend(current.iter().cloned());

        let mut out = MergeOutcome::default();
        for f in fragments {
            if known.contains(f.url.as_str()) {
                out.skipped_known_url += 1;
                continue;
            }
            next.push(Arc::new(Headline::new(f.text, f.url, 0)));
            out.added += 1;
        }

        if self.max_len > 0 && next.len() > self.max_len {
            let excess = next.len() - self.max_len;
            next.drain(0..excess);
            out.evicted = excess;
        }

        out.total = next.len();
        if out.added > 0 || out.evicted > 0 {
            self.pool.store(Arc::new(next));
        }
        out
    }

    /// Copy the pool out for persistence.
    pub fn records(&self) -> Vec<HeadlineRecord> {
        self.pool.load().iter().map(|h| h.to_record()).collect()
    }

    /// Highest scored headlines first; ties keep discovery order.
    pub fn top(&self, n: usize) -> Vec<HeadlineRecord> {
        let mut all = self.records();
        // sort_by is stable
        all.sort_by(|a, b| b.score.cmp(&a.score));
        all.truncate(n);
        all
    }
}

pub fn distinct_sources(pool: &[Arc<Headline>]) -> usize {
    pool.iter()
        .map(|h| h.url.as_str())
        .collect::<HashSet<_>>()
        .len()
}
