// src/error.rs
//! Failure conditions surfaced by the mixer core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MashupError {
    /// The very first refresh produced nothing to serve. Fatal at startup.
    #[error("no headlines could be collected on startup")]
    EmptyPoolAtStartup,

    /// Fewer than two distinct source URLs in the pool; no pairing is possible.
    #[error("cannot pair headlines: pool has {distinct} distinct source(s), need at least 2")]
    InsufficientDiversity { distinct: usize },

    #[error("snapshot persistence failed: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl MashupError {
    /// Whether the caller may retry later (e.g. after the next refresh).
    pub fn is_retryable(&self) -> bool {
        matches!(self, MashupError::InsufficientDiversity { .. })
    }
}
