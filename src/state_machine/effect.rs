//! Effects produced by state transitions

use crate::catalog::Language;
use crate::reply::{Menu, Outbound};
use crate::system_prompt::Prompt;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    // Session mutations
    SetLanguage(&'static Language),
    ClearHistory,
    /// Append the user turn and then the assistant turn, trimming after each
    RecordExchange { user: String, assistant: String },
    /// One more assistant response issued
    CountTurn,

    // Delivery
    Send(Outbound),
    /// Pieces of one long reply, delivered with a pause between them
    SendChunks(Vec<String>),
    ShowTyping,

    /// Ask the generation collaborator for an answer
    RequestGeneration(GenerationRequest),
}

/// A pending answer: the user's message and the assembled prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub user_text: String,
    pub prompt: Prompt,
}

impl Effect {
    pub fn send_text(text: impl Into<String>) -> Self {
        Effect::Send(Outbound::Text(text.into()))
    }

    pub fn send_menu(menu: Menu) -> Self {
        Effect::Send(Outbound::Menu(menu))
    }
}
