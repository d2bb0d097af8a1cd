//! Long-term memory store
//!
//! Cross-run retrieval keyed by task similarity. The store interface matches
//! what a vector index offers (nearest-neighbor lookup plus append); the
//! bundled [`KeywordStore`] scores by token overlap and persists to one JSON
//! file, which is all the agent itself needs to know about.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Store errors
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MemoryError>;

/// Nearest-neighbor retrieval plus append-only persistence.
///
/// Concurrent runs may race on read-then-write of the same key; last write
/// wins, no transactional guarantee.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Retrieve up to `top_k` entries most similar to `key`, newline-joined.
    /// Returns an empty string when nothing matches.
    async fn retrieve(&self, key: &str, top_k: usize) -> Result<String>;

    /// Persist one (key, value) entry for future runs.
    async fn persist(&self, key: &str, value: &str) -> Result<()>;
}

/// One persisted memory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    key: String,
    value: String,
    created_at: DateTime<Local>,
}

/// Token-overlap nearest-neighbor store backed by a JSON file.
pub struct KeywordStore {
    path: Option<PathBuf>,
    entries: RwLock<Vec<Entry>>,
}

impl KeywordStore {
    /// Open a file-backed store, loading existing entries if present.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("ignoring corrupt memory store {:?}: {}", path, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        debug!("opened memory store with {} entries", entries.len());
        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    /// Purely in-memory store.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no entries are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn flush(&self, entries: &[Entry]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for KeywordStore {
    async fn retrieve(&self, key: &str, top_k: usize) -> Result<String> {
        let query = tokenize(key);
        if query.is_empty() {
            return Ok(String::new());
        }

        let entries = self.entries.read().await;
        let mut scored: Vec<(f64, &Entry)> = entries
            .iter()
            .map(|entry| (overlap_score(&query, &tokenize(&entry.key)), entry))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let hits: Vec<&str> = scored
            .iter()
            .take(top_k)
            .map(|(_, entry)| entry.value.as_str())
            .collect();

        Ok(hits.join("\n"))
    }

    async fn persist(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(Entry {
            key: key.to_string(),
            value: value.to_string(),
            created_at: Local::now(),
        });
        self.flush(&entries).await
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}

fn overlap_score(query: &[String], candidate: &[String]) -> f64 {
    if candidate.is_empty() {
        return 0.0;
    }
    let matched = query.iter().filter(|token| candidate.contains(*token)).count();
    matched as f64 / (query.len().max(candidate.len())) as f64
}
