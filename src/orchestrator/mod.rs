//! Turn-taking orchestrator
//!
//! A single cooperative poller that decides when the assistant responds.
//! Each tick claims a turn from the shared state (pending utterances first,
//! then prolonged silence) and, if one is granted, runs a response cycle:
//!
//! 1. Re-check the busy flags and set `ai_thinking` (abort if busy)
//! 2. Build the prompt from persona, ranked memories and recent turns
//! 3. Call the generator under its time budget and validate the output
//! 4. If the assistant wants to speak, log the reply and queue it for synthesis
//! 5. Clear `ai_thinking`
//!
//! Collaborator failures end the cycle quietly (or with the configured
//! fallback reply); they never stop the loop.

pub use crate::state::Trigger;

use crate::config::ParleyConfig;
use crate::llm::{generate_validated, Generation, Generator};
use crate::memory::{MemoryKind, MemoryStore};
use crate::prompt::{Persona, PromptBuilder};
use crate::state::{SharedState, Speaker, TurnDecision};
use crate::voice::SpeechQueue;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Result of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Shutdown requested; the loop should exit
    Shutdown,
    /// Someone is speaking or the assistant is already thinking
    Blocked,
    /// System not ready yet
    NotReady,
    /// Nothing to respond to
    Idle,
    /// A response cycle ran
    Cycle(CycleOutcome),
}

/// Result of one response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A flag turned busy before the cycle started; utterances were requeued
    Aborted,
    /// The reply was logged and queued for synthesis
    Spoke(String),
    /// Valid output that chose not to speak
    Declined,
    /// Output failed validation
    Malformed,
    /// Generator unreachable or too slow; `fallback` holds any reply spoken instead
    Unavailable { fallback: Option<String> },
}

/// Turn-taking scheduler and response-cycle runner
pub struct Orchestrator {
    state: Arc<SharedState>,
    store: Arc<MemoryStore>,
    generator: Arc<dyn Generator>,
    speech: SpeechQueue,
    prompts: PromptBuilder,
    poll_interval: Duration,
    silence_threshold: chrono::Duration,
    silence_sentinel: String,
    fallback_reply: Option<String>,
    generator_timeout: Duration,
    record_utterances: bool,
}

impl Orchestrator {
    pub fn new(
        config: &ParleyConfig,
        state: Arc<SharedState>,
        store: Arc<MemoryStore>,
        generator: Arc<dyn Generator>,
        speech: SpeechQueue,
    ) -> Self {
        let tt = &config.turn_taking;
        let prompts = PromptBuilder::new(
            Persona::from_config(&config.assistant),
            tt.context_lines,
            config.memory.recall_count,
        );

        Self {
            state,
            store,
            generator,
            speech,
            prompts,
            poll_interval: tt.poll_interval(),
            silence_threshold: tt.silence_threshold(),
            silence_sentinel: tt.silence_sentinel.clone(),
            fallback_reply: tt
                .fallback_reply
                .clone()
                .filter(|reply| !reply.trim().is_empty()),
            generator_timeout: config.generator.timeout(),
            record_utterances: config.memory.record_utterances,
        }
    }

    /// Evaluate the scheduling rules once at `now` and run a cycle if due.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        let decision = self
            .state
            .claim_turn(now, self.silence_threshold, &self.silence_sentinel)
            .await;

        match decision {
            TurnDecision::Shutdown => TickOutcome::Shutdown,
            TurnDecision::Blocked => TickOutcome::Blocked,
            TurnDecision::NotReady => TickOutcome::NotReady,
            TurnDecision::Idle => TickOutcome::Idle,
            TurnDecision::Respond(trigger) => TickOutcome::Cycle(self.respond(trigger, now).await),
        }
    }

    /// Run one response cycle for `trigger`.
    pub async fn respond(&self, trigger: Trigger, now: DateTime<Utc>) -> CycleOutcome {
        if !self.state.try_begin_thinking().await {
            tracing::debug!(silence = trigger.is_silence(), "Response cycle aborted, state busy");
            if let Trigger::Utterances(parts) = trigger {
                self.state.requeue_front(parts).await;
            }
            return CycleOutcome::Aborted;
        }

        let text = trigger.text();
        let outcome = self.generate_and_speak(&text, now).await;
        self.state.end_thinking().await;

        if self.record_utterances && !trigger.is_silence() {
            let session_id = self.state.session_id().await;
            if let Err(e) = self.store.remember(&text, MemoryKind::Raw, session_id, now).await {
                tracing::warn!(error = %e, "Failed to record utterance memory");
            }
        }

        outcome
    }

    async fn generate_and_speak(&self, text: &str, now: DateTime<Utc>) -> CycleOutcome {
        let snapshot = self.state.snapshot().await;
        let prompt = self.prompts.assemble(&snapshot, &self.store, text, now).await;

        tracing::debug!(
            generator = self.generator.name(),
            prompt_chars = prompt.len(),
            "Requesting response"
        );
        let generation = generate_validated(self.generator.as_ref(), &prompt, self.generator_timeout).await;

        match &generation {
            Generation::Valid(reply) => {
                tracing::debug!(
                    wants_to_speak = reply.wants_to_speak,
                    monologue = %reply.internal_monologue,
                    "Generator replied"
                );
                match generation.speakable() {
                    Some(spoken) => {
                        let spoken = spoken.to_string();
                        self.speak(&spoken).await;
                        CycleOutcome::Spoke(spoken)
                    }
                    None => CycleOutcome::Declined,
                }
            }
            Generation::Malformed { raw, reason } => {
                tracing::warn!(reason = %reason, raw_chars = raw.len(), "Discarding malformed generator output");
                CycleOutcome::Malformed
            }
            Generation::Unavailable(e) => {
                tracing::warn!(generator = self.generator.name(), error = %e, "Generator unavailable");
                match &self.fallback_reply {
                    Some(fallback) => {
                        self.speak(fallback).await;
                        CycleOutcome::Unavailable {
                            fallback: Some(fallback.clone()),
                        }
                    }
                    None => CycleOutcome::Unavailable { fallback: None },
                }
            }
        }
    }

    async fn speak(&self, reply: &str) {
        self.state.append_turn(Speaker::Ai, reply).await;
        if let Err(e) = self.speech.enqueue(reply).await {
            tracing::warn!(error = %e, "Reply not queued for synthesis");
        }
    }

    /// Poll until shutdown is requested. A running cycle always completes.
    pub async fn run(&self) {
        tracing::info!(
            poll_ms = self.poll_interval.as_millis() as u64,
            silence_secs = self.silence_threshold.num_seconds(),
            "Orchestrator started"
        );

        loop {
            match self.tick(Utc::now()).await {
                TickOutcome::Shutdown => break,
                TickOutcome::Cycle(outcome) => {
                    tracing::debug!(outcome = ?outcome, "Response cycle finished");
                }
                _ => {}
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        tracing::info!("Orchestrator stopped");
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
