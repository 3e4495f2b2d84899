//! Assistant persona
//!
//! The persona is the instruction block that opens every generator prompt.
//! Templates may reference `{name}` and `{mode}`.

use crate::config::{AssistantConfig, AssistantMode};

/// Built-in persona template
pub const DEFAULT_TEMPLATE: &str = "\
You are {name}, an AI assistant taking part in a spoken conversation.
You are helpful, friendly and slightly sarcastic.
You have two modes:
- conversation: you always respond to user messages, briefly.
- discussion: you speak only if your name is mentioned or after a long silence.
You keep an internal monologue that is never spoken. Put longer reasoning there.
Keep the reply short unless you are asked by name for a longer explanation.
Current mode is: {mode}
Reply in the same language the user is speaking.";

/// Assistant identity substituted into the prompt template
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub mode: AssistantMode,
    template: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, mode: AssistantMode) -> Self {
        Self {
            name: name.into(),
            mode,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Replace the built-in template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        let persona = Self::new(config.name.clone(), config.mode);
        match &config.persona_template {
            Some(template) if !template.trim().is_empty() => persona.with_template(template.clone()),
            _ => persona,
        }
    }

    /// Template with name and mode filled in.
    pub fn render(&self) -> String {
        self.template
            .replace("{name}", &self.name)
            .replace("{mode}", self.mode.as_str())
            .trim()
            .to_string()
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::from_config(&AssistantConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_name_and_mode() {
        let persona = Persona::new("Juno", AssistantMode::Discussion);
        let text = persona.render();
        assert!(text.starts_with("You are Juno,"));
        assert!(text.contains("Current mode is: discussion"));
        assert!(!text.contains("{name}"));
        assert!(!text.contains("{mode}"));
    }

    #[test]
    fn test_custom_template_from_config() {
        let config = AssistantConfig {
            name: "Max".to_string(),
            mode: AssistantMode::Conversation,
            persona_template: Some("I am {name} ({mode}).".to_string()),
        };
        assert_eq!(Persona::from_config(&config).render(), "I am Max (conversation).");
    }

    #[test]
    fn test_blank_template_falls_back_to_default() {
        let config = AssistantConfig {
            persona_template: Some("  ".to_string()),
            ..AssistantConfig::default()
        };
        assert!(Persona::from_config(&config).render().starts_with("You are Aria,"));
    }
}
