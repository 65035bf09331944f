// src/ingest/providers/html.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use scraper::{Html, Selector};

use crate::ingest::config::SourceConfig;
use crate::ingest::types::{Teaser, TeaserProvider};

/// Extract teasers from an HTML page according to `cfg`.
///
/// Teasers without a link are skipped; relative links are prefixed with
/// `cfg.url_prefix`.
pub fn extract_teasers(html: &str, cfg: &SourceConfig) -> Result<Vec<Teaser>> {
    let teaser_sel = Selector::parse(&cfg.selector)
        .map_err(|e| anyhow!("bad selector {:?} for {}: {e}", cfg.selector, cfg.name))?;
    let link_sel = match cfg.link_selector.as_deref() {
        Some(s) => Some(
            Selector::parse(s)
                .map_err(|e| anyhow!("bad link selector {s:?} for {}: {e}", cfg.name))?,
        ),
        None => None,
    };

    let doc = Html::parse_document(html);
    let mut out = Vec::new();
    for el in doc.select(&teaser_sel) {
        let href = match &link_sel {
            Some(ls) => el
                .select(ls)
                .next()
                .and_then(|a| a.value().attr("href")),
            None => el.value().attr("href"),
        }
        .unwrap_or_default()
        .trim();

        if href.is_empty() {
            continue;
        }

        out.push(Teaser {
            text: el.text().collect::<String>(),
            href: cfg.absolutize(href),
        });
    }
    Ok(out)
}

/// Fetches a news front page over HTTP and scrapes its teasers.
pub struct HtmlTeaserProvider {
    cfg: SourceConfig,
    http: reqwest::Client,
    fixture: Option<String>,
}

impl HtmlTeaserProvider {
    pub fn new(cfg: SourceConfig, http: reqwest::Client) -> Self {
        Self {
            cfg,
            http,
            fixture: None,
        }
    }

    /// Serve a fixed page instead of fetching.
    pub fn from_fixture(cfg: SourceConfig, html: &str) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
            fixture: Some(html.to_string()),
        }
    }

    async fn page(&self) -> Result<String> {
        if let Some(f) = &self.fixture {
            return Ok(f.clone());
        }
        let resp = self
            .http
            .get(&self.cfg.page_url)
            .send()
            .await
            .with_context(|| format!("fetch {}", self.cfg.page_url))?
            .error_for_status()
            .with_context(|| format!("status from {}", self.cfg.page_url))?;
        resp.text()
            .await
            .with_context(|| format!("read body of {}", self.cfg.page_url))
    }
}

#[async_trait]
impl TeaserProvider for HtmlTeaserProvider {
    async fn fetch_teasers(&self) -> Result<Vec<Teaser>> {
        let body = self.page().await?;

        let t0 = std::time::Instant::now();
        let out = extract_teasers(&body, &self.cfg)?;
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("mixer_parse_ms").record(ms);
        counter!("mixer_teasers_total").increment(out.len() as u64);

        Ok(out)
    }

    fn name(&self) -> &str {
        &self.cfg.name
    }
}
