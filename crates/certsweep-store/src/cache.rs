//! Durable outcome cache keyed by (subject name, certificate number).

use crate::error::Result;
use certsweep_core::{CacheEntry, CacheKey};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// In-memory map of every outcome observed so far, backed by one JSON file.
///
/// The map is loaded once at startup and saved once at the end of a full
/// run. A crash mid-run therefore loses the session's new entries from the
/// durable cache even though they exist in memory and in the result file —
/// the result file is the crash-safe artifact, the cache only accelerates
/// future runs. Failures are cached exactly like final outcomes, so a
/// re-run will skip identifiers whose earlier probe merely timed out.
#[derive(Debug)]
pub struct HistoryCache {
    path: PathBuf,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl HistoryCache {
    /// Load the cache from disk.
    ///
    /// A missing, unreadable, or corrupt file yields an empty cache; loading
    /// never fails the run. Individual malformed entries are skipped.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Some(entries) => {
                    info!(count = entries.len(), path = %path.display(), "loaded outcome cache");
                    entries
                }
                None => {
                    warn!(path = %path.display(), "cache file is not valid JSON, starting empty");
                    HashMap::new()
                }
            },
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no readable cache file, starting empty");
                HashMap::new()
            }
        };

        Self { path, entries }
    }

    /// Parse either on-disk form: the entry array (also the legacy flat
    /// sequence) or an object map keyed by cache key.
    fn parse(contents: &str) -> Option<HashMap<CacheKey, CacheEntry>> {
        let value: JsonValue = serde_json::from_str(contents).ok()?;

        let mut entries = HashMap::new();
        match value {
            JsonValue::Array(items) => {
                for item in items {
                    Self::insert_parsed(&mut entries, item);
                }
            }
            JsonValue::Object(map) => {
                for (_, item) in map {
                    Self::insert_parsed(&mut entries, item);
                }
            }
            _ => return None,
        }

        Some(entries)
    }

    fn insert_parsed(entries: &mut HashMap<CacheKey, CacheEntry>, item: JsonValue) {
        match serde_json::from_value::<CacheEntry>(item) {
            Ok(entry) => {
                // Keyed by the entry's own fields so both on-disk forms
                // normalize to the same mapping
                entries.insert(entry.key(), entry);
            }
            Err(err) => {
                warn!(error = %err, "skipping malformed cache entry");
            }
        }
    }

    /// Look up the cached outcome for a key.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Whether an outcome is cached for this key.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite the outcome for the entry's key.
    pub fn put(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.key(), entry);
    }

    /// Number of cached outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no outcomes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The file this cache persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full mapping back to disk.
    ///
    /// Emitted as a pretty-printed JSON array, one entry per line, non-ASCII
    /// preserved literally; the array form stays readable as the legacy flat
    /// sequence. Entries are ordered by key for stable output.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut entries: Vec<&CacheEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.key().as_str().cmp(b.key().as_str()));

        let mut out = String::from("[\n");
        let last = entries.len().saturating_sub(1);
        for (index, entry) in entries.iter().enumerate() {
            let json = serde_json::to_string(entry)?;
            if index < last {
                let _ = writeln!(out, "  {json},");
            } else {
                let _ = writeln!(out, "  {json}");
            }
        }
        out.push(']');

        fs::write(&self.path, out)?;
        info!(count = self.entries.len(), path = %self.path.display(), "saved outcome cache");
        Ok(())
    }
}
