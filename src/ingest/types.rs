// src/ingest/types.rs
use anyhow::Result;

/// One scraped teaser element: its visible text and absolute link.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Teaser {
    pub text: String, // raw, un-normalized
    pub href: String, // absolute URL
}

#[async_trait::async_trait]
pub trait TeaserProvider: Send + Sync {
    async fn fetch_teasers(&self) -> Result<Vec<Teaser>>;
    fn name(&self) -> &str;
}
