//! Parley configuration management

use crate::error::{Error, Result};
use crate::memory::scoring::ScoringWeights;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for second-valued windows (100 years), small enough that
/// timestamp arithmetic with them cannot overflow
pub const MAX_WINDOW_SECS: u64 = 100 * 365 * 86_400;

fn chrono_seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(MAX_WINDOW_SECS) as i64)
}

/// Main Parley configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Assistant persona
    pub assistant: AssistantConfig,

    /// Turn-taking scheduler configuration
    pub turn_taking: TurnTakingConfig,

    /// Long-term memory configuration
    pub memory: MemoryConfig,

    /// Response generator service configuration
    pub generator: GeneratorConfig,

    /// Speech synthesis configuration
    pub speech: SpeechConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file. Missing sections use defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject values the scheduler and memory store cannot work with.
    pub fn validate(&self) -> Result<()> {
        let tt = &self.turn_taking;
        if tt.poll_interval_ms == 0 {
            return Err(Error::Config("turn_taking.poll_interval_ms must be > 0".into()));
        }
        if tt.short_term_capacity == 0 {
            return Err(Error::Config("turn_taking.short_term_capacity must be > 0".into()));
        }
        if tt.silence_sentinel.trim().is_empty() {
            return Err(Error::Config("turn_taking.silence_sentinel must not be blank".into()));
        }

        let mem = &self.memory;
        if mem.recall_count == 0 || mem.candidate_count < mem.recall_count {
            return Err(Error::Config(
                "memory.candidate_count must be >= memory.recall_count > 0".into(),
            ));
        }
        if mem.summarization_interval == 0 {
            return Err(Error::Config("memory.summarization_interval must be > 0".into()));
        }
        if mem.decay_rate < 0.0 || !mem.decay_rate.is_finite() {
            return Err(Error::Config("memory.decay_rate must be a non-negative number".into()));
        }
        if !mem.weights.is_valid() {
            return Err(Error::Config("memory.weights must be non-negative".into()));
        }
        if mem.reflection_threshold < 0.0 || mem.prune_min_importance < 0.0 {
            return Err(Error::Config(
                "memory importance thresholds must be non-negative".into(),
            ));
        }
        if mem.maintenance_interval_secs == 0 {
            return Err(Error::Config("memory.maintenance_interval_secs must be > 0".into()));
        }

        for (key, secs) in [
            ("turn_taking.silence_threshold_secs", tt.silence_threshold_secs),
            ("memory.reflection_window_secs", mem.reflection_window_secs),
            ("memory.prune_max_age_secs", mem.prune_max_age_secs),
        ] {
            if secs > MAX_WINDOW_SECS {
                return Err(Error::Config(format!(
                    "{} must be at most {}",
                    key, MAX_WINDOW_SECS
                )));
            }
        }

        if self.generator.timeout_secs == 0 || self.speech.timeout_secs == 0 {
            return Err(Error::Config("collaborator timeouts must be > 0".into()));
        }
        Ok(())
    }
}

/// Assistant persona configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Name the assistant answers to
    pub name: String,

    /// Operating mode
    pub mode: AssistantMode,

    /// Replacement persona template; `{name}` and `{mode}` are substituted
    pub persona_template: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Aria".to_string(),
            mode: AssistantMode::Conversation,
            persona_template: None,
        }
    }
}

/// How eagerly the assistant takes a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssistantMode {
    /// Always answers user messages, briefly
    #[default]
    Conversation,

    /// Speaks only when named or after a long silence
    Discussion,
}

impl AssistantMode {
    /// Mode label used in prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantMode::Conversation => "conversation",
            AssistantMode::Discussion => "discussion",
        }
    }
}

/// Turn-taking scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnTakingConfig {
    /// Orchestrator tick in milliseconds
    pub poll_interval_ms: u64,

    /// Seconds without activity before a silence-triggered cycle
    pub silence_threshold_secs: u64,

    /// Delay before the system is marked ready, in milliseconds
    pub startup_delay_ms: u64,

    /// Text handed to the generator when the silence branch fires
    pub silence_sentinel: String,

    /// Spoken when the generator is unreachable (None = stay silent)
    pub fallback_reply: Option<String>,

    /// Short-term log capacity
    pub short_term_capacity: usize,

    /// Number of short-term log lines included in a prompt
    pub context_lines: usize,
}

impl TurnTakingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn silence_threshold(&self) -> chrono::Duration {
        chrono_seconds(self.silence_threshold_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl Default for TurnTakingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            silence_threshold_secs: 15,
            startup_delay_ms: 3000,
            silence_sentinel: "...".to_string(),
            fallback_reply: None,
            short_term_capacity: 10,
            context_lines: 5,
        }
    }
}

/// Long-term memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Memories injected into each prompt (k)
    pub recall_count: usize,

    /// Candidates fetched from the similarity index before scoring (M)
    pub candidate_count: usize,

    /// User utterances between summaries
    pub summarization_interval: u64,

    /// Trailing-window importance sum that triggers a reflection
    pub reflection_threshold: f64,

    /// Trailing window for reflection, in seconds
    pub reflection_window_secs: u64,

    /// Recency decay rate per second since last access
    pub decay_rate: f64,

    /// Score weights
    pub weights: ScoringWeights,

    /// Records older than this (seconds) are prune candidates
    pub prune_max_age_secs: u64,

    /// Records at or above this importance survive pruning
    pub prune_min_importance: f64,

    /// Maintenance tick in seconds
    pub maintenance_interval_secs: u64,

    /// Similarity index call budget in milliseconds
    pub index_timeout_ms: u64,

    /// Summarizer call budget in seconds
    pub summarizer_timeout_secs: u64,

    /// Store each consolidated user turn as a raw memory
    pub record_utterances: bool,

    /// Snapshot file for the bundled in-memory index
    pub persist_path: Option<PathBuf>,
}

impl MemoryConfig {
    pub fn reflection_window(&self) -> chrono::Duration {
        chrono_seconds(self.reflection_window_secs)
    }

    pub fn prune_max_age(&self) -> chrono::Duration {
        chrono_seconds(self.prune_max_age_secs)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_millis(self.index_timeout_ms)
    }

    pub fn summarizer_timeout(&self) -> Duration {
        Duration::from_secs(self.summarizer_timeout_secs)
    }

    /// Snapshot path, falling back to the platform data directory.
    pub fn resolved_persist_path(&self) -> Option<PathBuf> {
        self.persist_path.clone().or_else(|| {
            dirs_next::data_dir().map(|dir| dir.join("parley").join("memory.json"))
        })
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            recall_count: 5,
            candidate_count: 50,
            summarization_interval: 10,
            reflection_threshold: 20.0,
            reflection_window_secs: 3600,
            decay_rate: 0.0005,
            weights: ScoringWeights::default(),
            prune_max_age_secs: 86_400,
            prune_min_importance: 2.0,
            maintenance_interval_secs: 60,
            index_timeout_ms: 5000,
            summarizer_timeout_secs: 30,
            record_utterances: true,
            persist_path: None,
        }
    }
}

/// Response generator service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Generate endpoint of an Ollama-compatible service
    pub api_url: String,

    /// Model name
    pub model: String,

    /// Per-call budget in seconds
    pub timeout_secs: u64,
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/api/generate".to_string(),
            model: "llama3.1:8b".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Per-utterance synthesis budget in seconds
    pub timeout_secs: u64,

    /// Speaking rate used by the console synthesizer to pace output
    pub words_per_minute: u32,
}

impl SpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            words_per_minute: 160,
        }
    }
}
