//! Speech input and output
//!
//! ```text
//!  Transcriber ──CaptureEvent──▶ CaptureWorker ──push_utterance──▶ SharedState
//!                                                                      │
//!  Synthesizer ◀──speak── SpeechWorker ◀──SpeechQueue── Orchestrator ◀─┘
//! ```
//!
//! The capture worker is the only writer of `user_speaking`; the speech
//! worker is the only writer of `ai_speaking`.

pub mod capture;
pub mod console;
pub mod speech;

pub use capture::CaptureWorker;
pub use console::{ConsoleSynthesizer, StdinTranscriber};
pub use speech::{SpeechQueue, SpeechWorker};

use crate::error::Result;
use async_trait::async_trait;

/// Something a transcriber observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The user started talking
    SpeechStarted,
    /// The user stopped talking
    SpeechStopped,
    /// A finished transcription
    Transcript(String),
}

/// Speech-to-text source.
#[async_trait]
pub trait Transcriber: Send {
    /// Next capture event; `None` once the input is exhausted.
    async fn next_event(&mut self) -> Result<Option<CaptureEvent>>;
}

/// Text-to-speech sink.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text`, returning once playback has finished.
    async fn speak(&self, text: &str) -> Result<()>;

    fn name(&self) -> &str;
}
