//! Headline Mixer — Binary Entrypoint
//! Boots the Axum HTTP server with the headline pool, pairing store and
//! background refresh wired in.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("headline_mixer=info,ingest=info,votes=info,warn"));

    // try_init: Shuttle may already have installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    // An empty pool on startup is fatal: do not serve.
    let router = headline_mixer::app().await?;

    Ok(router.into())
}
