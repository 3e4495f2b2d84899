//! Prompt construction
//!
//! - `persona`: assistant identity and instruction template
//! - `builder`: generator prompt plus condensation/reflection prompts

pub mod builder;
pub mod persona;

pub use builder::{condensation_prompt, reflection_prompt, PromptBuilder, OUTPUT_INSTRUCTION};
pub use crate::config::AssistantMode;
pub use persona::{Persona, DEFAULT_TEMPLATE};
