// src/snapshot.rs
//! Snapshot persistence for the headline pool.
//!
//! The on-disk format is a JSON array of `{ "text", "url", "score" }`,
//! rewritten in full after every mutation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::headlines::HeadlineRecord;

pub const DEFAULT_SNAPSHOT_PATH: &str = "headlines.json";
pub const ENV_SNAPSHOT_PATH: &str = "MIXER_SNAPSHOT_PATH";

pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Vec<HeadlineRecord>>;
    fn save(&self, records: &[HeadlineRecord]) -> Result<()>;
}

/// Load a snapshot, treating any failure as an empty pool.
pub fn load_or_empty(store: &dyn SnapshotStore) -> Vec<HeadlineRecord> {
    match store.load() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "snapshot not loaded, starting empty");
            Vec::new()
        }
    }
}

/// JSON file on disk, replaced atomically via temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    path: PathBuf,
    // serializes concurrent writers to the same temp file
    write_lock: std::sync::Arc<Mutex<()>>,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Default::default(),
        }
    }

    /// `$MIXER_SNAPSHOT_PATH` or `headlines.json` in the working dir.
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_SNAPSHOT_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SNAPSHOT_PATH));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileSnapshot {
    fn load(&self) -> Result<Vec<HeadlineRecord>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading snapshot {}", self.path.display()))?;
        let v = serde_json::from_str(&raw)
            .with_context(|| format!("parsing snapshot {}", self.path.display()))?;
        Ok(v)
    }

    fn save(&self, records: &[HeadlineRecord]) -> Result<()> {
        let body = serde_json::to_vec(records).context("serializing snapshot")?;
        let _g = self.write_lock.lock();
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

// --- Test helper ---
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    pub saved: Mutex<Vec<Vec<HeadlineRecord>>>,
    pub initial: Vec<HeadlineRecord>,
    pub fail_saves: bool,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(initial: Vec<HeadlineRecord>) -> Self {
        Self {
            initial,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().len()
    }

    pub fn last(&self) -> Option<Vec<HeadlineRecord>> {
        self.saved.lock().last().cloned()
    }
}

impl SnapshotStore for MemorySnapshot {
    fn load(&self) -> Result<Vec<HeadlineRecord>> {
        Ok(self.initial.clone())
    }

    fn save(&self, records: &[HeadlineRecord]) -> Result<()> {
        if self.fail_saves {
            anyhow::bail!("snapshot sink unavailable");
        }
        self.saved.lock().push(records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(t: &str, u: &str, s: i64) -> HeadlineRecord {
        HeadlineRecord {
            text: t.into(),
            url: u.into(),
            score: s,
        }
    }

    #[test]
    fn file_roundtrip_uses_lowercase_fields() {
        let dir = tempfile::tempdir().unwrap();
        let snap = JsonFileSnapshot::new(dir.path().join("state/headlines.json"));
        snap.save(&[rec("Hej", "http://a", 2)]).unwrap();

        let raw = fs::read_to_string(snap.path()).unwrap();
        assert_eq!(raw, r#"[{"text":"Hej","url":"http://a","score":2}]"#);
        assert_eq!(snap.load().unwrap(), vec![rec("Hej", "http://a", 2)]);
        assert!(!snap.tmp_path().exists());
    }

    #[test]
    fn missing_or_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snap = JsonFileSnapshot::new(dir.path().join("nope.json"));
        assert!(snap.load().is_err());
        assert!(load_or_empty(&snap).is_empty());

        fs::write(snap.path(), "{not json").unwrap();
        assert!(load_or_empty(&snap).is_empty());
    }
}
