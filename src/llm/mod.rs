//! Language-model collaborators
//!
//! The orchestrator talks to the response generator through `Generator`,
//! and the memory store condenses text through `Summarizer`. Generator
//! output is validated as soon as it arrives and surfaced as a tagged
//! `Generation` outcome; nothing downstream touches unvalidated fields.

pub mod ollama;

pub use ollama::OllamaClient;

use crate::error::{with_timeout, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response generator interface.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Raw model output for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Human-readable name (used in logs).
    fn name(&self) -> &str;
}

/// Summarization interface used for condensation and reflection.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Free-text summary for a prompt.
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// The three fields the generator must emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorReply {
    /// Whether the assistant wants to take the turn
    pub wants_to_speak: bool,
    /// Text to speak
    pub reply: String,
    /// Unspoken reasoning
    pub internal_monologue: String,
}

impl GeneratorReply {
    /// Validate raw generator output against the reply schema.
    ///
    /// Surrounding whitespace and a Markdown code fence are tolerated; any
    /// other deviation (missing field, wrong type, trailing text) is
    /// `Error::MalformedOutput`.
    pub fn parse(raw: &str) -> Result<Self> {
        let body = strip_code_fence(raw.trim());
        if body.is_empty() {
            return Err(Error::MalformedOutput("empty output".to_string()));
        }
        serde_json::from_str(body).map_err(|e| Error::MalformedOutput(e.to_string()))
    }

    /// Speak only when asked to and there is something to say.
    pub fn should_speak(&self) -> bool {
        self.wants_to_speak && !self.reply.trim().is_empty()
    }
}

/// JSON schema sent to generators that support structured output.
pub fn reply_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "wantsToSpeak": { "type": "boolean" },
            "reply": { "type": "string" },
            "internalMonologue": { "type": "string" }
        },
        "required": ["wantsToSpeak", "reply", "internalMonologue"]
    })
}

/// Outcome of one generator call.
#[derive(Debug)]
pub enum Generation {
    /// Output passed validation
    Valid(GeneratorReply),
    /// Output arrived but failed validation
    Malformed { raw: String, reason: String },
    /// Transport failure or timeout
    Unavailable(Error),
}

impl Generation {
    /// The reply to act on, if any. Malformed output counts as not wanting to speak.
    pub fn speakable(&self) -> Option<&str> {
        match self {
            Generation::Valid(reply) if reply.should_speak() => Some(reply.reply.trim()),
            _ => None,
        }
    }
}

/// Call the generator under a time budget and validate what comes back.
pub async fn generate_validated(
    generator: &dyn Generator,
    prompt: &str,
    timeout: Duration,
) -> Generation {
    let raw = match with_timeout("generate", timeout, generator.generate(prompt)).await {
        Ok(raw) => raw,
        // The service answered, but not with anything usable
        Err(Error::MalformedOutput(reason)) => {
            return Generation::Malformed {
                raw: String::new(),
                reason,
            }
        }
        Err(e) => return Generation::Unavailable(e),
    };

    match GeneratorReply::parse(&raw) {
        Ok(reply) => Generation::Valid(reply),
        Err(e) => Generation::Malformed {
            raw,
            reason: e.to_string(),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted collaborators shared by unit tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every prompt it receives.
    pub struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String>>>,
        pub prompts: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedGenerator {
        pub fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn replying(json: &str) -> Self {
            Self::new(vec![Ok(json.to_string())])
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Transport("script exhausted".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Summarizer that returns a fixed text and records prompts.
    pub struct FixedSummarizer {
        pub output: Result<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FixedSummarizer {
        pub fn new(output: &str) -> Self {
            Self {
                output: Ok(output.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                output: Err(Error::Transport("summarizer offline".into())),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.output {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Transport(e.to_string())),
            }
        }
    }
}
