//! Generator prompt assembly
//!
//! Layout, top to bottom:
//!
//! ```text
//! <persona>
//!
//! Relevant memories:
//! <one memory per line, most relevant first>
//!
//! Recent conversation:
//! <last N short-term log lines>
//!
//! New message:
//! <utterance>
//!
//! <output instruction>
//! ```

use super::persona::Persona;
use crate::memory::{MemoryStore, ScoredMemory};
use crate::state::StateSnapshot;
use chrono::{DateTime, Utc};

/// Closing instruction naming the three output fields.
pub const OUTPUT_INSTRUCTION: &str = "\
Respond with a single JSON object with exactly these keys:
  wantsToSpeak: boolean, true if you want to speak the reply
  reply: string, the spoken reply
  internalMonologue: string, your unspoken thoughts
Output nothing outside the JSON object.";

/// Builds generator prompts from state, memories and the new utterance.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: Persona,
    context_lines: usize,
    recall_count: usize,
}

impl PromptBuilder {
    pub fn new(persona: Persona, context_lines: usize, recall_count: usize) -> Self {
        Self {
            persona,
            context_lines,
            recall_count,
        }
    }

    /// Rank memories for the utterance and build the prompt.
    ///
    /// Ranking refreshes access times of the recalled records; nothing else
    /// is written.
    pub async fn assemble(
        &self,
        snapshot: &StateSnapshot,
        store: &MemoryStore,
        utterance: &str,
        now: DateTime<Utc>,
    ) -> String {
        let memories = store.rank(utterance, now, self.recall_count).await;
        self.build(snapshot, &memories, utterance)
    }

    /// Pure prompt rendering from already-ranked memories.
    pub fn build(&self, snapshot: &StateSnapshot, memories: &[ScoredMemory], utterance: &str) -> String {
        let memory_lines: Vec<&str> = memories.iter().map(|m| m.record.content.as_str()).collect();
        let recent = snapshot.recent_turns(self.context_lines);

        let mut prompt = self.persona.render();
        prompt.push_str("\n\nRelevant memories:\n");
        prompt.push_str(&memory_lines.join("\n"));
        prompt.push_str("\n\nRecent conversation:\n");
        prompt.push_str(&recent.join("\n"));
        prompt.push_str("\n\nNew message:\n");
        prompt.push_str(utterance.trim());
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_INSTRUCTION);
        prompt
    }
}

/// Prompt asking the summarizer to condense user utterances (oldest first).
pub fn condensation_prompt(utterances: &[String]) -> String {
    format!(
        "Summarize the following conversation into key points:\n---\n{}\n---\n\
         Return the most important facts or topics that should be remembered.",
        utterances.join("\n")
    )
}

/// Prompt asking the summarizer for a higher-level insight over memories.
pub fn reflection_prompt<'a>(memories: impl IntoIterator<Item = &'a str>) -> String {
    let text: Vec<&str> = memories.into_iter().collect();
    format!(
        "Review the following important memories:\n\n{}\n\n\
         Generate a higher-level reflection or insight that summarizes patterns or lessons.",
        text.join("\n")
    )
}
