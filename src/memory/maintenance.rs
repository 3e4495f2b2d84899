//! Periodic memory maintenance
//!
//! Runs in its own context on a fixed timer. Each pass summarizes any
//! utterance batches the shared state captured, then checks for a
//! reflection, then prunes stale records. Failures are logged and the next
//! pass carries on.

use super::store::MemoryStore;
use crate::config::MemoryConfig;
use crate::error::Error;
use crate::llm::Summarizer;
use crate::state::SharedState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// What one maintenance pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub summaries: usize,
    pub reflections: usize,
    pub pruned: usize,
    pub failures: usize,
}

/// Background summarize → reflect → prune loop
pub struct MaintenanceWorker {
    store: Arc<MemoryStore>,
    state: Arc<SharedState>,
    summarizer: Arc<dyn Summarizer>,
    interval: Duration,
    reflection_threshold: f64,
    prune_max_age: chrono::Duration,
    prune_min_importance: f64,
}

impl MaintenanceWorker {
    pub fn new(
        store: Arc<MemoryStore>,
        state: Arc<SharedState>,
        summarizer: Arc<dyn Summarizer>,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            store,
            state,
            summarizer,
            interval: config.maintenance_interval(),
            reflection_threshold: config.reflection_threshold,
            prune_max_age: config.prune_max_age(),
            prune_min_importance: config.prune_min_importance,
        }
    }

    /// Run one pass at `now`.
    pub async fn run_once(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();
        let session_id = self.state.session_id().await;

        for batch in self.state.take_summary_batches().await {
            match self
                .store
                .summarize_and_store(&batch, self.summarizer.as_ref(), session_id.clone(), now)
                .await
            {
                Ok(Some(_)) => report.summaries += 1,
                Ok(None) => {}
                Err(e) => {
                    report.failures += 1;
                    log_failure("summarize", &e);
                }
            }
        }

        match self
            .store
            .reflect(now, self.reflection_threshold, self.summarizer.as_ref())
            .await
        {
            Ok(Some(_)) => report.reflections += 1,
            Ok(None) => {}
            Err(e) => {
                report.failures += 1;
                log_failure("reflect", &e);
            }
        }

        match self
            .store
            .prune(now, self.prune_max_age, self.prune_min_importance)
            .await
        {
            Ok(deleted) => report.pruned = deleted.len(),
            Err(e) => {
                report.failures += 1;
                log_failure("prune", &e);
            }
        }

        report
    }

    /// Tick until shutdown is requested.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // Skip the first immediate tick
        ticker.tick().await;

        tracing::info!(interval_secs = self.interval.as_secs(), "Memory maintenance started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.state.wait_for_shutdown() => break,
            }

            let report = self.run_once(Utc::now()).await;
            if report != MaintenanceReport::default() {
                tracing::debug!(
                    summaries = report.summaries,
                    reflections = report.reflections,
                    pruned = report.pruned,
                    failures = report.failures,
                    "Maintenance pass complete"
                );
            }
        }
        tracing::info!("Memory maintenance stopped");
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Recoverable collaborator failures log at `warn`, the rest at `error`.
fn failure_level(error: &Error) -> tracing::Level {
    if error.is_recoverable() {
        tracing::Level::WARN
    } else {
        tracing::Level::ERROR
    }
}

fn log_failure(task: &'static str, error: &Error) {
    if failure_level(error) == tracing::Level::WARN {
        tracing::warn!(task, error = %error, "Maintenance task failed");
    } else {
        tracing::error!(task, error = %error, "Maintenance task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::FixedSummarizer;
    use crate::memory::index::InMemoryIndex;
    use crate::memory::record::{MemoryKind, MemoryRecordBuilder};

    fn worker(summarizer: Arc<FixedSummarizer>) -> (MaintenanceWorker, Arc<MemoryStore>, Arc<SharedState>) {
        let config = MemoryConfig::default();
        let store = Arc::new(MemoryStore::new(Arc::new(InMemoryIndex::new()), &config));
        let state = Arc::new(SharedState::new(10, config.summarization_interval));
        let worker = MaintenanceWorker::new(store.clone(), state.clone(), summarizer, &config);
        (worker, store, state)
    }

    #[tokio::test]
    async fn test_summaries_follow_interval_multiples() {
        let summarizer = Arc::new(FixedSummarizer::new("summary"));
        let (worker, store, state) = worker(summarizer.clone());

        for i in 1..=15 {
            state.push_utterance(&format!("message {}", i)).await;
        }
        let report = worker.run_once(Utc::now()).await;
        assert_eq!(report.summaries, 1);

        for i in 16..=30 {
            state.push_utterance(&format!("message {}", i)).await;
        }
        let report = worker.run_once(Utc::now()).await;
        assert_eq!(report.summaries, 2);

        let summaries = store
            .records()
            .await
            .into_iter()
            .filter(|r| r.kind == MemoryKind::Summary)
            .count();
        assert_eq!(summaries, 3);

        // Second batch covers messages 11..=20, oldest first
        let prompts = summarizer.prompts.lock().unwrap().clone();
        assert!(prompts[1].contains("message 11\n"));
        assert!(prompts[1].contains("message 20"));
        assert!(!prompts[1].contains("message 10\n"));
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let (worker, store, state) = worker(Arc::new(FixedSummarizer::failing()));
        for i in 1..=10 {
            state.push_utterance(&format!("message {}", i)).await;
        }
        let report = worker.run_once(Utc::now()).await;
        assert_eq!(report.summaries, 0);
        assert_eq!(report.failures, 1);
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_failure_level_follows_recoverability() {
        assert_eq!(failure_level(&Error::Transport("down".into())), tracing::Level::WARN);
        assert_eq!(
            failure_level(&Error::StateInvariant("memory r1 already exists".into())),
            tracing::Level::ERROR
        );
    }

    #[tokio::test]
    async fn test_pass_reflects_and_prunes() {
        let summarizer = Arc::new(FixedSummarizer::new("insight"));
        let (worker, store, _state) = worker(summarizer);
        let now = Utc::now();

        let stale = MemoryRecordBuilder::new(MemoryKind::Raw)
            .content("stale chatter")
            .created_at(now - chrono::Duration::days(2))
            .build()
            .unwrap();
        store.insert(stale.clone()).await.unwrap();
        for i in 0..2 {
            let important = MemoryRecordBuilder::new(MemoryKind::Raw)
                .content(format!("important {}", i))
                .importance(10.0)
                .created_at(now - chrono::Duration::minutes(5))
                .build()
                .unwrap();
            store.insert(important).await.unwrap();
        }

        let report = worker.run_once(now).await;
        assert_eq!(report.reflections, 1);
        assert_eq!(report.pruned, 1);
        assert!(store.get(&stale.id).await.is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (worker, _store, state) = worker(Arc::new(FixedSummarizer::new("x")));
        let handle = Arc::new(worker).spawn();
        state.request_shutdown().await;
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
