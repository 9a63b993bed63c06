//! Prompt assembly for the Chef.AI persona
//!
//! The prompt is one system instruction followed by the session history with
//! the current user message already appended, so the context always ends on
//! the latest user turn.

use crate::catalog::{Cuisine, Language};
use crate::llm::{LlmMessage, LlmRequest};
use crate::session::{History, Turn};

/// Everything the generation collaborator needs for one answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub history: Vec<Turn>,
}

impl Prompt {
    /// Convert to a provider request with the given sampling settings
    pub fn to_request(&self, max_tokens: Option<u32>, temperature: Option<f32>) -> LlmRequest {
        LlmRequest {
            system: self.system.clone(),
            messages: self
                .history
                .iter()
                .map(|turn| LlmMessage {
                    role: turn.role,
                    content: turn.text.clone(),
                })
                .collect(),
            max_tokens,
            temperature,
        }
    }
}

/// Build the prompt for answering `user_text`
pub fn build_prompt(
    language: &Language,
    cuisine: &Cuisine,
    servings: &str,
    history: &History,
    user_text: &str,
) -> Prompt {
    let history = history.with_pending(Turn::user(user_text));
    let system = build_system_prompt(language, cuisine, servings, history.len());
    Prompt { system, history }
}

/// The persona instruction, parameterized by the session's choices
pub fn build_system_prompt(
    language: &Language,
    cuisine: &Cuisine,
    servings: &str,
    history_len: usize,
) -> String {
    let cuisine = cuisine.name;
    let language = language.name;
    format!(
        r#"You are Chef.AI, a world-renowned culinary master with decades of experience.

CORE PERSONALITY:
- Direct and confident, no unnecessary pleasantries
- Witty and humorous but professional
- Expert in {cuisine} cuisine
- Answer EVERYTHING, even off-topic questions (but redirect to cooking)
- Never say "I don't know" - always provide value
- Speak ONLY in {language}

CONVERSATION RULES:
- NO greetings unless user greets first
- Be concise yet informative
- Use humor and chef expertise
- For recipes: detailed ingredients for {servings} servings, clear steps, pro tips
- If off-topic: acknowledge briefly, then pivot to culinary angle
- Remember conversation context
- Be entertaining and engaging

USER CONTEXT:
- Cuisine: {cuisine}
- Language: {language}
- Servings needed: {servings}
- Previous messages: {history_len} in history

Respond naturally as the legendary Chef.AI would."#
    )
}
