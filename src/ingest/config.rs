// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "MIXER_SOURCES_PATH";

/// Where and how to find teasers on one news site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Page to fetch.
    pub page_url: String,
    /// CSS selector for teaser elements.
    pub selector: String,
    /// Sub-selector for the link inside a teaser; `None` = the teaser's own href.
    #[serde(default)]
    pub link_selector: Option<String>,
    /// Prepended to hrefs that do not start with `http`.
    #[serde(default)]
    pub url_prefix: String,
}

impl SourceConfig {
    /// Make `href` absolute using `url_prefix`.
    pub fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.url_prefix, href)
        }
    }
}

/// The three Danish news front pages the mixer was built around.
pub fn builtin_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "ekstrabladet".into(),
            page_url: "http://www.ekstrabladet.dk/".into(),
            selector: ".df-article".into(),
            link_selector: Some("a".into()),
            url_prefix: "http://www.ekstrabladet.dk/".into(),
        },
        SourceConfig {
            name: "bt".into(),
            page_url: "http://bt.dk/".into(),
            selector: "a.teaser-link".into(),
            link_selector: None,
            url_prefix: "http://bt.dk".into(),
        },
        SourceConfig {
            name: "dr".into(),
            page_url: "https://www.dr.dk/nyheder/allenyheder/".into(),
            selector: "article h3 a".into(),
            link_selector: None,
            url_prefix: "https://www.dr.dk".into(),
        },
    ]
}

/// Load sources from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load sources using env var + fallbacks:
/// 1) $MIXER_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in list
pub fn load_sources_default() -> Result<Vec<SourceConfig>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("MIXER_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(builtin_sources())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SourceConfig>> {
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<SourceConfig>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<SourceConfig>,
    }
    let v: TomlSources = toml::from_str(s)?;
    clean_list(v.sources)
}

fn parse_json(s: &str) -> Result<Vec<SourceConfig>> {
    let v: Vec<SourceConfig> = serde_json::from_str(s)?;
    clean_list(v)
}

fn clean_list(items: Vec<SourceConfig>) -> Result<Vec<SourceConfig>> {
    let mut out: Vec<SourceConfig> = Vec::with_capacity(items.len());
    for mut it in items {
        it.name = it.name.trim().to_string();
        it.selector = it.selector.trim().to_string();
        if it.page_url.trim().is_empty() || it.selector.is_empty() {
            continue;
        }
        if out.iter().any(|o| o.name == it.name) {
            continue;
        }
        out.push(it);
    }
    if out.is_empty() {
        return Err(anyhow!("no usable sources in config"));
    }
    Ok(out)
}
