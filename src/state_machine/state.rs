//! Conversation state types

use crate::catalog::Cuisine;

/// Where a user is in the language -> cuisine -> chat flow.
///
/// The chosen cuisine only exists while chatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    AwaitingLanguage,
    AwaitingCuisine,
    Chatting {
        cuisine: &'static Cuisine,
    },
}

impl ChatState {
    pub fn cuisine(&self) -> Option<&'static Cuisine> {
        match self {
            ChatState::Chatting { cuisine } => Some(*cuisine),
            ChatState::AwaitingLanguage | ChatState::AwaitingCuisine => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ChatState::AwaitingLanguage => "awaiting_language",
            ChatState::AwaitingCuisine => "awaiting_cuisine",
            ChatState::Chatting { .. } => "chatting",
        }
    }
}
