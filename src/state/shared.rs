//! Shared conversation state
//!
//! All fields live behind a single `tokio::sync::RwLock`. Compound decisions
//! (flags + queue + timestamp) are made inside one critical section by
//! `claim_turn`, so the orchestrator never acts on a torn view.

use super::short_term::{ShortTermLog, Speaker};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::{Notify, RwLock};

/// Consistent view of the busy/ready/shutdown flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagSnapshot {
    pub user_speaking: bool,
    pub ai_speaking: bool,
    pub ai_thinking: bool,
    pub system_ready: bool,
    pub shutdown_requested: bool,
}

impl FlagSnapshot {
    /// Someone is talking or the assistant is already generating.
    pub fn is_busy(&self) -> bool {
        self.user_speaking || self.ai_speaking || self.ai_thinking
    }
}

/// Point-in-time copy of the whole state, used for prompt assembly.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub flags: FlagSnapshot,
    /// Utterances waiting in the queue
    pub pending: usize,
    /// Short-term log lines, oldest first
    pub short_term: Vec<String>,
    pub user_message_count: u64,
    pub last_activity: DateTime<Utc>,
    pub session_id: Option<String>,
}

impl StateSnapshot {
    /// The last `n` short-term lines, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[String] {
        let skip = self.short_term.len().saturating_sub(n);
        &self.short_term[skip..]
    }
}

/// Why a response cycle is being started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Pending user utterances, in arrival order
    Utterances(Vec<String>),
    /// Prolonged silence; carries the sentinel text
    Silence(String),
}

impl Trigger {
    /// Text handed to the prompt builder.
    pub fn text(&self) -> String {
        match self {
            Trigger::Utterances(parts) => parts.join(" "),
            Trigger::Silence(sentinel) => sentinel.clone(),
        }
    }

    pub fn is_silence(&self) -> bool {
        matches!(self, Trigger::Silence(_))
    }
}

/// Outcome of one scheduling decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDecision {
    /// Shutdown was requested
    Shutdown,
    /// User or assistant is busy
    Blocked,
    /// System not ready yet
    NotReady,
    /// Start a response cycle
    Respond(Trigger),
    /// Nothing to do this tick
    Idle,
}

struct StateInner {
    flags: FlagSnapshot,
    queue: VecDeque<String>,
    log: ShortTermLog,
    user_message_count: u64,
    last_activity: DateTime<Utc>,
    session_id: Option<String>,
    summary_interval: u64,
    /// Last `summary_interval` user utterances, oldest first
    user_history: VecDeque<String>,
    /// Batches captured when the counter hit a multiple of the interval
    summary_batches: Vec<Vec<String>>,
}

impl StateInner {
    fn reset_session(&mut self) {
        self.queue.clear();
        self.log.clear();
        self.user_message_count = 0;
        self.session_id = None;
        self.user_history.clear();
        self.summary_batches.clear();
    }
}

/// Process-wide state shared by every execution context.
pub struct SharedState {
    inner: RwLock<StateInner>,
    shutdown: Notify,
}

impl SharedState {
    /// Create state with the given short-term capacity and summarization interval.
    pub fn new(short_term_capacity: usize, summary_interval: u64) -> Self {
        Self {
            inner: RwLock::new(StateInner {
                flags: FlagSnapshot::default(),
                queue: VecDeque::new(),
                log: ShortTermLog::new(short_term_capacity),
                user_message_count: 0,
                last_activity: Utc::now(),
                session_id: None,
                summary_interval: summary_interval.max(1),
                user_history: VecDeque::new(),
                summary_batches: Vec::new(),
            }),
            shutdown: Notify::new(),
        }
    }

    // =========================================================================
    // Capture context
    // =========================================================================

    /// Append a transcribed utterance.
    ///
    /// Trims the text and drops it if empty. Otherwise pushes it to the
    /// queue and the short-term log, bumps the counter, and refreshes the
    /// activity timestamp in one step. Returns the new message count.
    pub async fn push_utterance(&self, text: &str) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut inner = self.inner.write().await;
        inner.queue.push_back(text.to_string());
        inner.log.push(Speaker::User, text);
        inner.user_message_count += 1;
        inner.last_activity = Utc::now();

        let interval = inner.summary_interval as usize;
        inner.user_history.push_back(text.to_string());
        while inner.user_history.len() > interval {
            inner.user_history.pop_front();
        }
        let count = inner.user_message_count;
        if count % inner.summary_interval == 0 {
            let batch: Vec<String> = inner.user_history.iter().cloned().collect();
            inner.summary_batches.push(batch);
            tracing::debug!(count, "Summary batch captured");
        }

        Some(count)
    }

    /// Capture callback: the user started or stopped speaking.
    pub async fn set_user_speaking(&self, speaking: bool) {
        self.inner.write().await.flags.user_speaking = speaking;
    }

    // =========================================================================
    // Synthesis context
    // =========================================================================

    /// Synthesis callback: playback started or stopped.
    ///
    /// Stopping refreshes the activity timestamp so the silence timer
    /// starts counting from the end of the assistant's speech.
    pub async fn set_ai_speaking(&self, speaking: bool) {
        let mut inner = self.inner.write().await;
        inner.flags.ai_speaking = speaking;
        if !speaking {
            inner.last_activity = Utc::now();
        }
    }

    // =========================================================================
    // Orchestrator context
    // =========================================================================

    /// Decide what the orchestrator should do this tick.
    ///
    /// Flags, queue, and timestamp are read and updated under one write
    /// lock. Pending utterances take priority over the silence branch; the
    /// silence branch resets the timestamp before returning so it cannot
    /// fire again on the next tick.
    pub async fn claim_turn(
        &self,
        now: DateTime<Utc>,
        silence_threshold: chrono::Duration,
        silence_sentinel: &str,
    ) -> TurnDecision {
        let mut inner = self.inner.write().await;
        let flags = inner.flags;

        if flags.shutdown_requested {
            return TurnDecision::Shutdown;
        }
        if flags.is_busy() {
            return TurnDecision::Blocked;
        }
        if !flags.system_ready {
            return TurnDecision::NotReady;
        }

        if !inner.queue.is_empty() {
            let drained: Vec<String> = inner.queue.drain(..).collect();
            return TurnDecision::Respond(Trigger::Utterances(drained));
        }

        if now - inner.last_activity > silence_threshold {
            inner.last_activity = now;
            return TurnDecision::Respond(Trigger::Silence(silence_sentinel.to_string()));
        }

        TurnDecision::Idle
    }

    /// Re-check the busy flags and, if clear, mark the assistant as thinking.
    ///
    /// Returns `false` (and changes nothing) when someone became busy since
    /// the turn was claimed.
    pub async fn try_begin_thinking(&self) -> bool {
        let mut inner = self.inner.write().await;
        if inner.flags.is_busy() {
            return false;
        }
        inner.flags.ai_thinking = true;
        true
    }

    /// Clear the thinking flag.
    pub async fn end_thinking(&self) {
        self.inner.write().await.flags.ai_thinking = false;
    }

    /// Put drained utterances back at the head of the queue, ahead of
    /// anything that arrived since, preserving their order.
    pub async fn requeue_front(&self, utterances: Vec<String>) {
        let mut inner = self.inner.write().await;
        for text in utterances.into_iter().rev() {
            inner.queue.push_front(text);
        }
    }

    /// Append a turn to the short-term log.
    pub async fn append_turn(&self, speaker: Speaker, text: &str) {
        self.inner.write().await.log.push(speaker, text);
    }

    /// Remove and return every pending utterance, oldest first.
    pub async fn drain_queue(&self) -> Vec<String> {
        self.inner.write().await.queue.drain(..).collect()
    }

    // =========================================================================
    // Maintenance context
    // =========================================================================

    /// Take the utterance batches that are due for summarization.
    pub async fn take_summary_batches(&self) -> Vec<Vec<String>> {
        std::mem::take(&mut self.inner.write().await.summary_batches)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn set_ready(&self, ready: bool) {
        self.inner.write().await.flags.system_ready = ready;
    }

    /// Ask every loop to stop after its current unit of work.
    pub async fn request_shutdown(&self) {
        self.inner.write().await.flags.shutdown_requested = true;
        self.shutdown.notify_waiters();
        tracing::info!("Shutdown requested");
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait_for_shutdown(&self) {
        loop {
            // Register before checking so a concurrent request is not missed
            let notified = self.shutdown.notified();
            if self.is_shutdown_requested().await {
                return;
            }
            notified.await;
        }
    }

    pub async fn is_shutdown_requested(&self) -> bool {
        self.inner.read().await.flags.shutdown_requested
    }

    /// Reset the queue, log, counter, and session id.
    pub async fn clear_session(&self) {
        self.inner.write().await.reset_session();
        tracing::debug!("Conversation session cleared");
    }

    /// Conversation boundary: clear the session and adopt a new id.
    pub async fn start_session(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        let mut inner = self.inner.write().await;
        inner.reset_session();
        inner.session_id = Some(session_id.clone());
        inner.last_activity = Utc::now();
        tracing::info!(session_id = %session_id, "Conversation session started");
    }

    /// Overwrite the activity timestamp.
    pub async fn touch_activity_at(&self, at: DateTime<Utc>) {
        self.inner.write().await.last_activity = at;
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn snapshot_flags(&self) -> FlagSnapshot {
        self.inner.read().await.flags
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        let inner = self.inner.read().await;
        StateSnapshot {
            flags: inner.flags,
            pending: inner.queue.len(),
            short_term: inner.log.lines(),
            user_message_count: inner.user_message_count,
            last_activity: inner.last_activity,
            session_id: inner.session_id.clone(),
        }
    }

    pub async fn session_id(&self) -> Option<String> {
        self.inner.read().await.session_id.clone()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(super::short_term::DEFAULT_CAPACITY, 10)
    }
}
