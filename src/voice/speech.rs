//! Synthesis context
//!
//! The orchestrator hands replies to a `SpeechQueue`; a single
//! `SpeechWorker` consumes them in order and brackets each playback with
//! `ai_speaking = true / false`. The flag is cleared on every exit path,
//! including synthesizer failure and timeout.

use super::Synthesizer;
use crate::error::{with_timeout, Error, Result};
use crate::state::SharedState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default number of replies that may wait for playback.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Producer side of the speak-request queue
#[derive(Debug, Clone)]
pub struct SpeechQueue {
    tx: mpsc::Sender<String>,
}

impl SpeechQueue {
    /// Create a queue and the receiver its worker consumes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue a reply for synthesis.
    pub async fn enqueue(&self, text: impl Into<String>) -> Result<()> {
        self.tx
            .send(text.into())
            .await
            .map_err(|_| Error::Speech("speech worker has stopped".into()))
    }
}

/// Sole consumer of the speak-request queue
pub struct SpeechWorker {
    rx: mpsc::Receiver<String>,
    synthesizer: Arc<dyn Synthesizer>,
    state: Arc<SharedState>,
    timeout: Duration,
}

impl SpeechWorker {
    pub fn new(
        rx: mpsc::Receiver<String>,
        synthesizer: Arc<dyn Synthesizer>,
        state: Arc<SharedState>,
        timeout: Duration,
    ) -> Self {
        Self {
            rx,
            synthesizer,
            state,
            timeout,
        }
    }

    /// Speak one reply. Failures are logged, never returned.
    pub async fn play(&self, text: &str) {
        self.state.set_ai_speaking(true).await;
        let result = with_timeout("speak", self.timeout, self.synthesizer.speak(text)).await;
        self.state.set_ai_speaking(false).await;

        match result {
            Ok(()) => tracing::debug!(
                synthesizer = self.synthesizer.name(),
                chars = text.len(),
                "Reply spoken"
            ),
            Err(e) => tracing::warn!(
                synthesizer = self.synthesizer.name(),
                error = %e,
                "Speech synthesis failed"
            ),
        }
    }

    /// Consume the queue until it closes or shutdown is requested.
    /// A reply already playing is allowed to finish.
    pub async fn run(mut self) {
        loop {
            let text = tokio::select! {
                next = self.rx.recv() => match next {
                    Some(text) => text,
                    None => break,
                },
                _ = self.state.wait_for_shutdown() => break,
            };
            self.play(&text).await;
        }

        let mut dropped = 0usize;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::info!(dropped, "Discarding unspoken replies");
        }
        tracing::info!("Speech worker stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
