//! # Dedupe Store
//! Persisted, ordered record of published item identifiers (oldest first).
//!
//! - Stored as a JSON array of strings; written via temp file + rename.
//! - Missing or corrupt state loads as empty (logged, never fatal).
//! - `record` is idempotent; `trim` keeps the most recent N entries.
//! - A failed write keeps the in-memory entry so the current process still
//!   skips the item; only a restart could re-publish it.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{BotError, Result};

#[derive(Debug, Default)]
pub struct DedupeStore {
    path: Option<PathBuf>,
    order: VecDeque<String>,
    index: HashSet<String>,
    max_entries: usize,
}

impl DedupeStore {
    /// Store without a backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. Unreadable or malformed state yields an empty store.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let ids: Vec<String> = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "dedupe state corrupt; starting empty");
                Vec::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "dedupe state unreadable; starting empty");
                Vec::new()
            }
        };

        let mut store = Self {
            path: Some(path),
            ..Self::default()
        };
        for id in ids {
            store.insert(id);
        }
        tracing::info!(entries = store.len(), "dedupe state loaded");
        store
    }

    /// Keep at most `max_entries` after each record (0 = unbounded).
    pub fn with_retention(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Add `id` and persist. Already-present ids are left where they are.
    pub fn record(&mut self, id: &str) -> Result<()> {
        if !self.insert(id.to_string()) {
            return Ok(());
        }
        if self.max_entries > 0 {
            self.trim(self.max_entries);
        }
        self.persist()
    }

    /// Keep only the `max_entries` most recently recorded identifiers.
    pub fn trim(&mut self, max_entries: usize) {
        while self.order.len() > max_entries {
            if let Some(old) = self.order.pop_front() {
                self.index.remove(&old);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Identifiers, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    fn insert(&mut self, id: String) -> bool {
        if id.is_empty() || self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.order.push_back(id);
        true
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_atomically(path, &self.order).map_err(|e| BotError::PersistenceUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn write_atomically(path: &Path, ids: &VecDeque<String>) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(ids).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&json)?;
    f.sync_all()?;
    fs::rename(tmp, path)
}
