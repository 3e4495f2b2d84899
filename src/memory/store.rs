//! Long-term memory store
//!
//! `MemoryStore` keeps an authoritative record table next to a pluggable
//! `SimilarityIndex`. Every write goes to the index first and only lands in
//! the table once the index accepted it, so a failed index call leaves no
//! partial write behind. The table lock is held across the index call, which
//! keeps each mutation atomic for concurrent readers.

use super::index::SimilarityIndex;
use super::record::{MemoryKind, MemoryRecord, MemoryRecordBuilder};
use super::scoring::{ScoredMemory, Scorer};
use crate::config::MemoryConfig;
use crate::error::{with_timeout, Error, Result};
use crate::llm::Summarizer;
use crate::prompt::{condensation_prompt, reflection_prompt};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Scored, self-maintaining long-term memory
pub struct MemoryStore {
    index: Arc<dyn SimilarityIndex>,
    records: RwLock<HashMap<String, MemoryRecord>>,
    scorer: Scorer,
    candidate_count: usize,
    reflection_window: chrono::Duration,
    index_timeout: Duration,
    summarizer_timeout: Duration,
}

impl MemoryStore {
    pub fn new(index: Arc<dyn SimilarityIndex>, config: &MemoryConfig) -> Self {
        Self {
            index,
            records: RwLock::new(HashMap::new()),
            scorer: Scorer::new(config.weights, config.decay_rate),
            candidate_count: config.candidate_count,
            reflection_window: config.reflection_window(),
            index_timeout: config.index_timeout(),
            summarizer_timeout: config.summarizer_timeout(),
        }
    }

    /// Hydrate the record table from the index. Returns the number loaded.
    pub async fn load(&self) -> Result<usize> {
        let entries = with_timeout("index list", self.index_timeout, self.index.list()).await?;
        let mut records = self.records.write().await;

        for entry in entries {
            let record = MemoryRecord::from_parts(entry.id, entry.text, entry.metadata);
            if let Err(e) = record.validate() {
                tracing::warn!(id = %record.id, error = %e, "Skipping invalid memory entry");
                continue;
            }
            records.insert(record.id.clone(), record);
        }

        tracing::info!(
            index = self.index.name(),
            count = records.len(),
            "Memory store loaded"
        );
        Ok(records.len())
    }

    /// Insert or replace a record by id.
    ///
    /// The first insert stamps `created_at = now`; a replacement keeps the
    /// stored creation time. `last_accessed` is refreshed to `now` and never
    /// moves backwards.
    pub async fn upsert(&self, mut record: MemoryRecord, now: DateTime<Utc>) -> Result<MemoryRecord> {
        let mut records = self.records.write().await;

        match records.get(&record.id) {
            Some(existing) => {
                record.created_at = existing.created_at;
                record.last_accessed = existing.last_accessed;
            }
            None => {
                record.created_at = now;
                record.last_accessed = now;
            }
        }
        record.touch(now);
        record.validate()?;

        self.write_index(&record).await?;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Store a new record exactly as given. Duplicate ids are rejected.
    pub async fn insert(&self, record: MemoryRecord) -> Result<()> {
        record.validate()?;
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(Error::StateInvariant(format!(
                "memory {} already exists",
                record.id
            )));
        }

        self.write_index(&record).await?;
        tracing::debug!(id = %record.id, kind = record.kind.as_str(), "Memory stored");
        records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Build and insert a record of the given kind created at `now`.
    pub async fn remember(
        &self,
        text: &str,
        kind: MemoryKind,
        session_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<MemoryRecord> {
        let record = MemoryRecordBuilder::new(kind)
            .content(text)
            .created_at(now)
            .session_id(session_id)
            .build()?;
        self.insert(record.clone()).await?;
        Ok(record)
    }

    /// Refresh a record's access time. Returns false for unknown ids.
    pub async fn touch_access(&self, id: &str, now: DateTime<Utc>) -> bool {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(id) else {
            return false;
        };
        record.touch(now);
        let touched = record.clone();
        self.mirror_access(std::slice::from_ref(&touched)).await;
        true
    }

    /// Top `k` memories for `query`, best first.
    ///
    /// Fetches `max(candidate_count, k)` neighbours from the index, scores
    /// the ones still present in the table, and refreshes the access time of
    /// every returned record. A blank query or an unavailable index yields an
    /// empty list. The table lock is held until the refreshed access times
    /// reach the index, so a concurrent prune never sees a half-ranked store.
    pub async fn rank(&self, query: &str, now: DateTime<Utc>, k: usize) -> Vec<ScoredMemory> {
        if query.trim().is_empty() || k == 0 {
            return Vec::new();
        }

        let fetch = self.candidate_count.max(k);
        let mut records = self.records.write().await;
        let hits = match with_timeout("index query", self.index_timeout, self.index.query(query, fetch)).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(index = self.index.name(), error = %e, "Memory recall skipped");
                return Vec::new();
            }
        };

        let fetched = hits.len();
        let candidates: Vec<(f64, MemoryRecord)> = hits
            .into_iter()
            .filter_map(|hit| records.get(&hit.id).map(|record| (hit.distance, record.clone())))
            .collect();
        if candidates.len() < fetched {
            tracing::debug!(
                orphans = fetched - candidates.len(),
                "Ignoring index hits with no stored record"
            );
        }

        let mut top = self.scorer.rank(candidates, now);
        top.truncate(k);

        let mut touched = Vec::with_capacity(top.len());
        for scored in &mut top {
            if let Some(record) = records.get_mut(&scored.record.id) {
                record.touch(now);
                scored.record = record.clone();
                touched.push(record.clone());
            }
        }
        self.mirror_access(&touched).await;
        drop(records);

        tracing::debug!(query_len = query.len(), recalled = top.len(), "Memories ranked");
        top
    }

    /// Condense a batch of user utterances into a summary memory.
    ///
    /// Returns `Ok(None)` when there is nothing to summarize or the summarizer
    /// answered with blank text. A failed summarizer call stores nothing.
    pub async fn summarize_and_store(
        &self,
        utterances: &[String],
        summarizer: &dyn Summarizer,
        session_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryRecord>> {
        if utterances.is_empty() {
            return Ok(None);
        }

        let prompt = condensation_prompt(utterances);
        let summary = with_timeout("summarize", self.summarizer_timeout, summarizer.summarize(&prompt)).await?;
        if summary.trim().is_empty() {
            tracing::warn!(utterances = utterances.len(), "Summarizer returned no text");
            return Ok(None);
        }

        let record = MemoryRecordBuilder::new(MemoryKind::Summary)
            .content(summary)
            .created_at(now)
            .session_id(session_id)
            .build()?;
        self.insert(record.clone()).await?;

        tracing::info!(id = %record.id, utterances = utterances.len(), "Summary stored");
        Ok(Some(record))
    }

    /// Distil recent memories into a reflection when they matter enough.
    ///
    /// Candidates are non-reflection records created inside the trailing
    /// window. Records already cited as parents by an earlier reflection are
    /// left out, so one batch of memories is reflected on at most once and
    /// an unchanged window does not re-trigger on every maintenance pass.
    /// A reflection is written only when the candidates' summed importance
    /// reaches `threshold`.
    pub async fn reflect(
        &self,
        now: DateTime<Utc>,
        threshold: f64,
        summarizer: &dyn Summarizer,
    ) -> Result<Option<MemoryRecord>> {
        let window_start = now - self.reflection_window;

        let mut candidates: Vec<MemoryRecord> = {
            let records = self.records.read().await;
            let reflected: HashSet<&str> = records
                .values()
                .filter(|r| r.kind == MemoryKind::Reflection)
                .flat_map(|r| r.parent_ids.iter().map(String::as_str))
                .collect();

            records
                .values()
                .filter(|r| r.kind != MemoryKind::Reflection)
                .filter(|r| r.created_at >= window_start && r.created_at <= now)
                .filter(|r| !reflected.contains(r.id.as_str()))
                .cloned()
                .collect()
        };

        let total: f64 = candidates.iter().map(|r| r.importance).sum();
        if candidates.is_empty() || total < threshold {
            tracing::debug!(candidates = candidates.len(), total, threshold, "No reflection due");
            return Ok(None);
        }

        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let prompt = reflection_prompt(candidates.iter().map(|r| r.content.as_str()));
        let insight = with_timeout("reflect", self.summarizer_timeout, summarizer.summarize(&prompt)).await?;
        if insight.trim().is_empty() {
            tracing::warn!(candidates = candidates.len(), "Summarizer returned no reflection");
            return Ok(None);
        }

        let record = MemoryRecordBuilder::new(MemoryKind::Reflection)
            .content(insight)
            .created_at(now)
            .parents(candidates.iter().map(|r| r.id.clone()))
            .build()?;
        self.insert(record.clone()).await?;

        tracing::info!(
            id = %record.id,
            parents = record.parent_ids.len(),
            total_importance = total,
            "Reflection stored"
        );
        Ok(Some(record))
    }

    /// Delete records older than `max_age` whose importance is below
    /// `min_importance`. Returns the deleted ids.
    pub async fn prune(
        &self,
        now: DateTime<Utc>,
        max_age: chrono::Duration,
        min_importance: f64,
    ) -> Result<Vec<String>> {
        let mut records = self.records.write().await;

        let mut expired: Vec<String> = records
            .values()
            .filter(|r| r.age(now) > max_age && r.importance < min_importance)
            .map(|r| r.id.clone())
            .collect();
        if expired.is_empty() {
            return Ok(expired);
        }
        expired.sort();

        with_timeout("index delete", self.index_timeout, self.index.delete(&expired)).await?;
        for id in &expired {
            records.remove(id);
        }

        tracing::info!(count = expired.len(), "Pruned stale memories");
        Ok(expired)
    }

    pub async fn get(&self, id: &str) -> Option<MemoryRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All records, oldest first.
    pub async fn records(&self) -> Vec<MemoryRecord> {
        let mut all: Vec<MemoryRecord> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    async fn write_index(&self, record: &MemoryRecord) -> Result<()> {
        with_timeout(
            "index upsert",
            self.index_timeout,
            self.index.upsert(&record.id, &record.content, record.metadata()),
        )
        .await
    }

    /// Best-effort copy of refreshed access times into the index.
    async fn mirror_access(&self, touched: &[MemoryRecord]) {
        for record in touched {
            if let Err(e) = self.write_index(record).await {
                tracing::warn!(id = %record.id, error = %e, "Failed to persist access time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::FixedSummarizer;
    use crate::memory::index::{InMemoryIndex, IndexEntry, IndexHit};
    use crate::memory::record::RecordMetadata;
    use async_trait::async_trait;

    fn config() -> MemoryConfig {
        MemoryConfig::default()
    }

    fn store() -> (MemoryStore, Arc<InMemoryIndex>) {
        let index = Arc::new(InMemoryIndex::new());
        (MemoryStore::new(index.clone(), &config()), index)
    }

    fn record(id: &str, content: &str, importance: f64, created_at: DateTime<Utc>) -> MemoryRecord {
        MemoryRecordBuilder::new(MemoryKind::Raw)
            .id(id)
            .content(content)
            .importance(importance)
            .created_at(created_at)
            .build()
            .unwrap()
    }

    /// Index that refuses every call.
    struct BrokenIndex;

    #[async_trait]
    impl SimilarityIndex for BrokenIndex {
        async fn query(&self, _text: &str, _k: usize) -> Result<Vec<IndexHit>> {
            Err(Error::Transport("index offline".into()))
        }
        async fn upsert(&self, _id: &str, _text: &str, _metadata: RecordMetadata) -> Result<()> {
            Err(Error::Transport("index offline".into()))
        }
        async fn delete(&self, _ids: &[String]) -> Result<()> {
            Err(Error::Transport("index offline".into()))
        }
        async fn list(&self) -> Result<Vec<IndexEntry>> {
            Err(Error::Transport("index offline".into()))
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    /// Delegates to an `InMemoryIndex`, answering queries slowly.
    struct SlowQueryIndex {
        inner: Arc<InMemoryIndex>,
        delay: Duration,
    }

    #[async_trait]
    impl SimilarityIndex for SlowQueryIndex {
        async fn query(&self, text: &str, k: usize) -> Result<Vec<IndexHit>> {
            tokio::time::sleep(self.delay).await;
            self.inner.query(text, k).await
        }
        async fn upsert(&self, id: &str, text: &str, metadata: RecordMetadata) -> Result<()> {
            self.inner.upsert(id, text, metadata).await
        }
        async fn delete(&self, ids: &[String]) -> Result<()> {
            self.inner.delete(ids).await
        }
        async fn list(&self) -> Result<Vec<IndexEntry>> {
            self.inner.list().await
        }
        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_prune_during_rank_stays_pruned() {
        let inner = Arc::new(InMemoryIndex::new());
        let index = SlowQueryIndex {
            inner: inner.clone(),
            delay: Duration::from_millis(200),
        };
        let store = Arc::new(MemoryStore::new(Arc::new(index), &config()));
        let now = Utc::now();
        store
            .insert(record("stale", "green tea", 1.0, now - chrono::Duration::hours(30)))
            .await
            .unwrap();

        let ranking = tokio::spawn({
            let store = store.clone();
            async move { store.rank("tea", now, 5).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let pruned = store
            .prune(now, chrono::Duration::hours(24), 2.0)
            .await
            .unwrap();
        ranking.await.unwrap();

        assert_eq!(pruned, vec!["stale".to_string()]);
        assert!(store.get("stale").await.is_none());
        assert!(inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_rank_ignores_hits_missing_from_table() {
        let (store, index) = store();
        let now = Utc::now();
        let orphan = record("orphan", "my cat is called Miso", 1.0, now);
        index.upsert(&orphan.id, &orphan.content, orphan.metadata()).await.unwrap();

        assert!(store.rank("cat Miso", now, 5).await.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let index = Arc::new(InMemoryIndex::open(&path).await.unwrap());
        let store = MemoryStore::new(index.clone(), &config());
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

        let now = Utc::now();
        let result = store
            .remember("my cat is called Miso", MemoryKind::Raw, None, now)
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
        assert!(index.is_empty().await);

        assert!(store.rank("cat Miso", now, 5).await.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_rank_returns_at_most_k_sorted() {
        let (store, _) = store();
        let now = Utc::now();
        for i in 0..8 {
            let r = record(&format!("m{}", i), &format!("the user likes tea number {}", i), 1.0 + i as f64, now);
            store.insert(r).await.unwrap();
        }

        let ranked = store.rank("does the user like tea", now, 5).await;
        assert_eq!(ranked.len(), 5);
        for pair in ranked.windows(2) {
            assert!(pair[0].score.total >= pair[1].score.total);
        }
        // Highest importance wins when relevance is comparable
        assert_eq!(ranked[0].record.id, "m7");
    }

    #[tokio::test]
    async fn test_rank_blank_query_is_empty() {
        let (store, _) = store();
        let now = Utc::now();
        store.insert(record("a", "anything", 1.0, now)).await.unwrap();
        assert!(store.rank("   ", now, 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_rank_tie_prefers_recent_access() {
        let (store, _) = store();
        let now = Utc::now();
        let created = now - chrono::Duration::hours(2);

        let mut older = record("a-old", "green tea", 1.0, created);
        older.touch(now - chrono::Duration::minutes(30));
        let mut newer = record("b-new", "green tea", 1.0, created);
        newer.touch(now - chrono::Duration::minutes(1));
        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();

        let ranked = store.rank("green tea", now, 1).await;
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.id, "b-new");
    }

    #[tokio::test]
    async fn test_rank_twice_raises_recency() {
        let (store, index) = store();
        let now = Utc::now();
        let mut r = record("a", "hiking in the alps", 1.0, now - chrono::Duration::hours(3));
        r.touch(now - chrono::Duration::hours(2));
        store.insert(r).await.unwrap();

        let first = store.rank("hiking", now, 1).await;
        let second = store.rank("hiking", now, 1).await;
        assert!(second[0].score.recency > first[0].score.recency);
        assert_eq!(store.get("a").await.unwrap().last_accessed, now);

        // The refreshed access time reaches the index too
        let entries = index.list().await.unwrap();
        assert_eq!(entries[0].metadata.last_accessed, now);
    }

    #[tokio::test]
    async fn test_rank_with_broken_index_is_empty() {
        let store = MemoryStore::new(Arc::new(BrokenIndex), &config());
        assert!(store.rank("hello", Utc::now(), 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let (store, _) = store();
        let now = Utc::now();
        store.insert(record("dup", "first", 1.0, now)).await.unwrap();
        let err = store.insert(record("dup", "second", 1.0, now)).await.unwrap_err();
        assert!(matches!(err, Error::StateInvariant(_)));
        assert_eq!(store.get("dup").await.unwrap().content, "first");
    }

    #[tokio::test]
    async fn test_insert_rejects_negative_importance() {
        let (store, _) = store();
        let mut r = record("neg", "text", 1.0, Utc::now());
        r.importance = -1.0;
        assert!(matches!(store.insert(r).await, Err(Error::StateInvariant(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_index_write_leaves_no_record() {
        let store = MemoryStore::new(Arc::new(BrokenIndex), &config());
        let result = store.insert(record("a", "text", 1.0, Utc::now())).await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_upsert_keeps_creation_time() {
        let (store, _) = store();
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(30);

        let first = store.upsert(record("u", "v1", 1.0, t0), t0).await.unwrap();
        assert_eq!(first.created_at, t0);

        let second = store.upsert(record("u", "v2", 3.0, t1), t1).await.unwrap();
        assert_eq!(second.created_at, t0);
        assert_eq!(second.last_accessed, t1);
        assert_eq!(second.content, "v2");
        assert_eq!(store.len().await, 1);

        // Access time never moves backwards
        let third = store.upsert(record("u", "v3", 3.0, t0), t0).await.unwrap();
        assert_eq!(third.last_accessed, t1);
    }

    #[tokio::test]
    async fn test_touch_access() {
        let (store, _) = store();
        let t0 = Utc::now();
        store.insert(record("a", "x", 1.0, t0)).await.unwrap();
        let later = t0 + chrono::Duration::seconds(5);
        assert!(store.touch_access("a", later).await);
        assert_eq!(store.get("a").await.unwrap().last_accessed, later);
        assert!(!store.touch_access("missing", later).await);
    }

    #[tokio::test]
    async fn test_prune_requires_old_and_unimportant() {
        let (store, index) = store();
        let now = Utc::now();
        let old = now - chrono::Duration::hours(25);
        let fresh = now - chrono::Duration::hours(1);

        store.insert(record("old-low", "a", 1.0, old)).await.unwrap();
        store.insert(record("old-high", "b", 2.0, old)).await.unwrap();
        store.insert(record("fresh-low", "c", 1.0, fresh)).await.unwrap();
        store.insert(record("fresh-high", "d", 5.0, fresh)).await.unwrap();

        let deleted = store
            .prune(now, chrono::Duration::hours(24), 2.0)
            .await
            .unwrap();
        assert_eq!(deleted, vec!["old-low".to_string()]);
        assert_eq!(store.len().await, 3);
        assert_eq!(index.len().await, 3);
        assert!(store.get("old-high").await.is_some());
        assert!(store.get("fresh-low").await.is_some());
    }

    #[tokio::test]
    async fn test_summarize_and_store() {
        let (store, _) = store();
        let summarizer = FixedSummarizer::new("User talked about tea and cats.");
        let utterances: Vec<String> = (1..=10).map(|i| format!("utterance {}", i)).collect();
        let now = Utc::now();

        let summary = store
            .summarize_and_store(&utterances, &summarizer, Some("s1".into()), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.kind, MemoryKind::Summary);
        assert_eq!(summary.importance, 2.0);
        assert_eq!(summary.session_id.as_deref(), Some("s1"));

        let prompt = summarizer.prompts.lock().unwrap()[0].clone();
        assert!(prompt.find("utterance 1\n").unwrap() < prompt.find("utterance 10").unwrap());
    }

    #[tokio::test]
    async fn test_failed_summarizer_stores_nothing() {
        let (store, _) = store();
        let summarizer = FixedSummarizer::failing();
        let result = store
            .summarize_and_store(&["hello".to_string()], &summarizer, None, Utc::now())
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_reflect_below_threshold_does_nothing() {
        let (store, _) = store();
        let now = Utc::now();
        for i in 0..5 {
            store.insert(record(&format!("r{}", i), "minor", 1.0, now)).await.unwrap();
        }
        let summarizer = FixedSummarizer::new("insight");
        assert!(store.reflect(now, 20.0, &summarizer).await.unwrap().is_none());
        assert_eq!(summarizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_reflect_at_threshold_records_parents() {
        let (store, _) = store();
        let now = Utc::now();
        store.insert(record("a", "likes tea", 10.0, now - chrono::Duration::minutes(10))).await.unwrap();
        store.insert(record("b", "likes cats", 10.0, now - chrono::Duration::minutes(5))).await.unwrap();
        // Outside the trailing window
        store.insert(record("c", "old news", 50.0, now - chrono::Duration::hours(2))).await.unwrap();

        let summarizer = FixedSummarizer::new("The user enjoys cosy things.");
        let reflection = store.reflect(now, 20.0, &summarizer).await.unwrap().unwrap();
        assert_eq!(reflection.kind, MemoryKind::Reflection);
        assert_eq!(reflection.importance, 10.0);
        assert_eq!(reflection.parent_ids, vec!["a".to_string(), "b".to_string()]);

        // Already-cited records do not trigger a second reflection
        assert!(store.reflect(now, 20.0, &summarizer).await.unwrap().is_none());
        assert_eq!(summarizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_remember_and_records() {
        let (store, _) = store();
        let t0 = Utc::now();
        store.remember("first", MemoryKind::Raw, None, t0).await.unwrap();
        store
            .remember("second", MemoryKind::Summary, None, t0 + chrono::Duration::seconds(1))
            .await
            .unwrap();
        let all = store.records().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "first");
        assert_eq!(all[1].importance, 2.0);
    }

    #[tokio::test]
    async fn test_load_hydrates_from_index() {
        let index = Arc::new(InMemoryIndex::new());
        let now = Utc::now();
        let r = record("persisted", "the user lives in Lyon", 1.0, now);
        index.upsert(&r.id, &r.content, r.metadata()).await.unwrap();

        let store = MemoryStore::new(index, &config());
        assert_eq!(store.load().await.unwrap(), 1);
        assert_eq!(store.get("persisted").await.unwrap(), r);
    }
}
