// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod headlines;
pub mod ingest;
pub mod matchmaker;
pub mod pairings;
pub mod segment;
pub mod service;
pub mod snapshot;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::MixerConfig;
pub use crate::error::MashupError;
pub use crate::service::{MixerService, RefreshReport, Vote};

use std::sync::Arc;
use tracing::info;

/// Build the full application: load config + sources + snapshot, run the
/// startup refresh, start the background refresh worker and ticker, and
/// return the router.
///
/// An empty pool after the startup refresh is an error; the caller should not
/// serve traffic then.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = MixerConfig::from_env();
    // before anything records, so descriptions reach the exporter
    let exporter = if cfg.metrics {
        Some(telemetry::Metrics::init()?)
    } else {
        None
    };

    let sources = ingest::config::load_sources_default()?;
    info!(sources = sources.len(), "sources loaded");
    let providers = ingest::providers::from_sources(sources);
    let snap = Arc::new(snapshot::JsonFileSnapshot::from_env());

    let (svc, requests) = MixerService::new(&cfg, snap, providers);
    let svc = Arc::new(svc);

    let report = svc.refresh().await?;
    info!(added = report.added, total = report.total, "startup refresh done");

    svc.start_refresh_worker(requests);
    if let Ok(period) = cfg.refresh_interval.to_std() {
        svc.start_ticker(period);
    }

    let mut router = api::router(AppState { service: svc });
    if let Some(m) = exporter {
        router = router.merge(m.router());
    }
    Ok(router)
}
