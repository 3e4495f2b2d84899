//! Similarity index collaborator
//!
//! `MemoryStore` reaches long-term storage only through the
//! `SimilarityIndex` trait: nearest-neighbour `query`, `upsert`, `delete`,
//! and a full `list` used to hydrate the store at start-up. Distances are
//! in `[0, 1]`, smaller meaning more similar.
//!
//! `InMemoryIndex` is the bundled implementation. It ranks by token-set
//! (Jaccard) distance and can snapshot its entries to a JSON file.

use super::record::RecordMetadata;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A stored entry: id, text, and record metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub text: String,
    pub metadata: RecordMetadata,
}

/// One nearest-neighbour result.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub id: String,
    pub text: String,
    pub metadata: RecordMetadata,
    /// Distance to the query, smaller = more similar
    pub distance: f64,
}

/// Pluggable similarity index interface.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Up to `k` entries closest to `text`, nearest first.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<IndexHit>>;

    /// Insert or replace an entry.
    async fn upsert(&self, id: &str, text: &str, metadata: RecordMetadata) -> Result<()>;

    /// Remove entries; unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<()>;

    /// Every stored entry.
    async fn list(&self) -> Result<Vec<IndexEntry>>;

    /// Human-readable backend name (used in logs).
    fn name(&self) -> &str;
}

/// In-process index with lexical distance and optional JSON persistence.
pub struct InMemoryIndex {
    entries: RwLock<HashMap<String, IndexEntry>>,
    persist_path: Option<PathBuf>,
}

impl InMemoryIndex {
    /// Create an empty, non-persistent index.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            persist_path: None,
        }
    }

    /// Open an index backed by a snapshot file, loading it if present.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = HashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let loaded: Vec<IndexEntry> = serde_json::from_slice(&bytes)?;
                for entry in loaded {
                    entries.insert(entry.id.clone(), entry);
                }
                tracing::info!(
                    path = %path.display(),
                    count = entries.len(),
                    "Loaded memory index snapshot"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No memory index snapshot yet");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path: Some(path),
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Write the snapshot file (no-op for non-persistent indexes).
    async fn persist(&self, entries: &HashMap<String, IndexEntry>) -> Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut sorted: Vec<&IndexEntry> = entries.values().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        let bytes = serde_json::to_vec_pretty(&sorted)?;

        // Write-then-rename keeps the previous snapshot intact on failure
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimilarityIndex for InMemoryIndex {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<IndexHit>> {
        let query_tokens = tokenize(text);
        let entries = self.entries.read().await;

        let mut hits: Vec<IndexHit> = entries
            .values()
            .map(|entry| IndexHit {
                id: entry.id.clone(),
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                distance: jaccard_distance(&query_tokens, &tokenize(&entry.text)),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn upsert(&self, id: &str, text: &str, metadata: RecordMetadata) -> Result<()> {
        if id.is_empty() {
            return Err(Error::Index("entry id must not be empty".into()));
        }
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(
            id.to_string(),
            IndexEntry {
                id: id.to_string(),
                text: text.to_string(),
                metadata,
            },
        );
        // Commit only once the snapshot is on disk
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        if !ids.iter().any(|id| entries.contains_key(id)) {
            return Ok(());
        }
        let mut next = entries.clone();
        for id in ids {
            next.remove(id);
        }
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<IndexEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Lowercased alphanumeric tokens.
fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// `1 - |A ∩ B| / |A ∪ B|`; two empty sets are maximally distant.
fn jaccard_distance(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    1.0 - intersection as f64 / union as f64
}
