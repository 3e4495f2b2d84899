//! Capture context
//!
//! Pulls events from a `Transcriber` and forwards them to the shared
//! state: start/stop toggle `user_speaking`, transcripts become queued
//! utterances.

use super::{CaptureEvent, Transcriber};
use crate::state::SharedState;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Sole producer of user utterances
pub struct CaptureWorker {
    transcriber: Box<dyn Transcriber>,
    state: Arc<SharedState>,
}

impl CaptureWorker {
    pub fn new(transcriber: Box<dyn Transcriber>, state: Arc<SharedState>) -> Self {
        Self { transcriber, state }
    }

    async fn forward(state: &SharedState, event: CaptureEvent) {
        match event {
            CaptureEvent::SpeechStarted => state.set_user_speaking(true).await,
            CaptureEvent::SpeechStopped => state.set_user_speaking(false).await,
            CaptureEvent::Transcript(text) => {
                if let Some(count) = state.push_utterance(&text).await {
                    tracing::debug!(count, chars = text.trim().len(), "Utterance captured");
                }
            }
        }
    }

    /// Forward events until the input ends, the transcriber fails, or
    /// shutdown is requested. `user_speaking` is cleared on exit.
    pub async fn run(mut self) {
        loop {
            let next = tokio::select! {
                next = self.transcriber.next_event() => next,
                _ = self.state.wait_for_shutdown() => break,
            };

            match next {
                Ok(Some(event)) => Self::forward(&self.state, event).await,
                Ok(None) => {
                    tracing::info!("Capture input ended");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Transcriber failed, capture stopped");
                    break;
                }
            }
        }

        self.state.set_user_speaking(false).await;
        tracing::info!("Capture worker stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
