//! Parley - turn-taking conversation agent with scored long-term memory
//!
//! Parley decides *when* an assistant should speak in a live conversation
//! and *what it remembers* between turns. Speech capture, response
//! generation and speech synthesis are pluggable collaborators.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  utterances   ┌───────────────────────────────────────┐
//! │   Capture    │──────────────▶│              SharedState               │
//! │ (Transcriber)│  user_speaking│  flags · queue · short-term log ·      │
//! └──────────────┘               │  activity timestamp · session          │
//!                                └───────┬───────────────────▲───────────┘
//!                          claim_turn    │                   │ ai_speaking
//!                                ┌───────▼────────┐   ┌──────┴───────┐
//!                                │  Orchestrator  │──▶│   Synthesis  │
//!                                │ (100 ms ticks) │   │ (SpeechQueue)│
//!                                └───┬────────┬───┘   └──────────────┘
//!                          prompt    │        │ rank
//!                        ┌───────────▼──┐  ┌──▼──────────────────────┐
//!                        │  Generator   │  │       MemoryStore        │
//!                        │  (Ollama)    │  │ relevance·recency·weight │
//!                        └──────────────┘  └──▲──────────────────────┘
//!                                             │ summarize · reflect · prune
//!                                       ┌─────┴──────────┐
//!                                       │  Maintenance   │
//!                                       │  (60 s timer)  │
//!                                       └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: shared conversation state and short-term log
//! - [`orchestrator`]: turn-taking scheduler and response cycle
//! - [`memory`]: long-term memory records, scoring, store and maintenance
//! - [`prompt`]: persona and prompt assembly
//! - [`llm`]: generator/summarizer interfaces and the Ollama client
//! - [`voice`]: capture and synthesis contexts
//! - [`config`]: configuration management

pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod orchestrator;
pub mod prompt;
pub mod state;
pub mod voice;

pub use config::ParleyConfig;
pub use error::{Error, Result};
