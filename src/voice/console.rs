//! Terminal stand-ins for the microphone and speaker
//!
//! `StdinTranscriber` treats every non-empty input line as one finished
//! transcription. `ConsoleSynthesizer` prints replies and then waits
//! roughly as long as speaking them aloud would take, so turn-taking
//! behaves as it would with real audio.

use super::{CaptureEvent, Synthesizer, Transcriber};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;

/// Line-oriented transcriber (stdin by default)
pub struct StdinTranscriber<R = BufReader<tokio::io::Stdin>> {
    lines: Lines<R>,
}

impl StdinTranscriber {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for StdinTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin> StdinTranscriber<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Transcriber for StdinTranscriber<R> {
    async fn next_event(&mut self) -> Result<Option<CaptureEvent>> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .map_err(|e| Error::Capture(format!("input read failed: {}", e)))?
        {
            if !line.trim().is_empty() {
                return Ok(Some(CaptureEvent::Transcript(line)));
            }
        }
        Ok(None)
    }
}

/// Prints replies to a terminal and paces them like speech
pub struct ConsoleSynthesizer {
    speaker: String,
    words_per_minute: u32,
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl ConsoleSynthesizer {
    /// Write to stdout, labelling lines with `speaker`.
    pub fn new(speaker: impl Into<String>, words_per_minute: u32) -> Self {
        Self::with_writer(speaker, words_per_minute, Box::new(tokio::io::stdout()))
    }

    pub fn with_writer(
        speaker: impl Into<String>,
        words_per_minute: u32,
        out: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Self {
        Self {
            speaker: speaker.into(),
            words_per_minute,
            out: Mutex::new(out),
        }
    }

    /// How long `text` takes to say at the configured rate (0 = instant).
    pub fn playback_duration(&self, text: &str) -> Duration {
        if self.words_per_minute == 0 {
            return Duration::ZERO;
        }
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }
}

#[async_trait]
impl Synthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        {
            let mut out = self.out.lock().await;
            out.write_all(format!("{}: {}\n", self.speaker, text).as_bytes())
                .await?;
            out.flush().await?;
        }
        tokio::time::sleep(self.playback_duration(text)).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
