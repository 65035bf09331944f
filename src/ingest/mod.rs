// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::ingest::types::{Teaser, TeaserProvider};
use crate::segment::{segment, Fragment};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("mixer_teasers_total", "Teasers scraped from providers.");
        describe_counter!(
            "mixer_fragments_total",
            "Headline fragments produced by segmentation."
        );
        describe_counter!(
            "mixer_teasers_dropped_total",
            "Teasers that did not split into at least two fragments."
        );
        describe_counter!(
            "mixer_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!("mixer_refresh_total", "Completed refresh cycles.");
        describe_counter!(
            "mixer_headlines_added_total",
            "Headlines added to the pool by refreshes."
        );
        describe_counter!("mixer_votes_total", "Accepted votes, by direction.");
        describe_histogram!("mixer_parse_ms", "Page parse time in milliseconds.");
        describe_gauge!("mixer_pool_size", "Headlines currently in the pool.");
        describe_gauge!(
            "mixer_last_refresh_ts",
            "Unix ts when the last refresh finished."
        );
    });
}

/// Segment a batch of teasers into fragments.
/// Returns (fragments, dropped_teasers).
pub fn segment_teasers(teasers: &[Teaser]) -> (Vec<Fragment>, usize) {
    let mut out = Vec::new();
    let mut dropped = 0usize;
    for t in teasers {
        let frags = segment(&t.text, &t.href);
        if frags.is_empty() {
            dropped += 1;
            continue;
        }
        for f in &frags {
            tracing::debug!(target: "ingest", url = %f.url, text = %f.text, "fragment");
        }
        out.extend(frags);
    }
    (out, dropped)
}

/// Run every provider once and segment what they return.
/// Provider errors are logged and skipped.
pub async fn collect(providers: &[Box<dyn TeaserProvider>]) -> Vec<Fragment> {
    ensure_metrics_described();

    let mut fragments = Vec::new();
    for p in providers {
        match p.fetch_teasers().await {
            Ok(teasers) => {
                let (mut frags, dropped) = segment_teasers(&teasers);
                tracing::info!(
                    target: "ingest",
                    provider = p.name(),
                    teasers = teasers.len(),
                    fragments = frags.len(),
                    dropped,
                    "provider scraped"
                );
                counter!("mixer_fragments_total").increment(frags.len() as u64);
                counter!("mixer_teasers_dropped_total").increment(dropped as u64);
                fragments.append(&mut frags);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, provider = p.name(), "provider error");
                counter!("mixer_provider_errors_total").increment(1);
            }
        }
    }
    fragments
}
