// src/config/mixer.rs
use chrono::Duration;
use std::env;

use crate::ingest::scheduler::DEFAULT_REFRESH_SECS;
use crate::pairings::DEFAULT_TTL_SECS;

pub const ENV_REFRESH_SECS: &str = "MIXER_REFRESH_SECS";
pub const ENV_PAIRING_TTL_SECS: &str = "MIXER_PAIRING_TTL_SECS";
pub const ENV_MAX_HEADLINES: &str = "MIXER_MAX_HEADLINES";
pub const ENV_METRICS: &str = "MIXER_METRICS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerConfig {
    pub refresh_interval: Duration,
    pub pairing_ttl: Duration,
    /// Retention cap for the headline pool; 0 = unbounded.
    pub max_headlines: usize,
    pub metrics: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::seconds(DEFAULT_REFRESH_SECS),
            pairing_ttl: Duration::seconds(DEFAULT_TTL_SECS),
            max_headlines: 0,
            metrics: false,
        }
    }
}

// parse a positive integer env var, ignoring junk
fn env_positive(name: &str) -> Option<i64> {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
}

impl MixerConfig {
    /// Defaults overridden by `MIXER_*` env vars. Invalid values fall back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            refresh_interval: env_positive(ENV_REFRESH_SECS)
                .map(Duration::seconds)
                .unwrap_or(d.refresh_interval),
            pairing_ttl: env_positive(ENV_PAIRING_TTL_SECS)
                .map(Duration::seconds)
                .unwrap_or(d.pairing_ttl),
            max_headlines: env_positive(ENV_MAX_HEADLINES)
                .map(|v| v as usize)
                .unwrap_or(d.max_headlines),
            metrics: env::var(ENV_METRICS).ok().as_deref() == Some("1"),
        }
    }
}
