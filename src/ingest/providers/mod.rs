// src/ingest/providers/mod.rs
pub mod html;

use crate::ingest::config::SourceConfig;
use crate::ingest::types::TeaserProvider;

/// One HTTP-backed provider per configured source, sharing a client.
pub fn from_sources(sources: Vec<SourceConfig>) -> Vec<Box<dyn TeaserProvider>> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("headline-mixer/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_default();
    sources
        .into_iter()
        .map(|cfg| Box::new(html::HtmlTeaserProvider::new(cfg, http.clone())) as Box<dyn TeaserProvider>)
        .collect()
}
