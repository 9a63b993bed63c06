//! Bounded rolling window of conversation turns

use crate::llm::MessageRole;
use std::collections::VecDeque;

/// Most turns kept per session; older turns are evicted first
pub const MAX_HISTORY: usize = 10;

/// One exchanged message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

/// FIFO history capped at [`MAX_HISTORY`] turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    turns: VecDeque<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, then drop from the front until the cap holds
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > MAX_HISTORY {
            self.turns.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// The window as it would look after appending `turn`
    pub fn with_pending(&self, turn: Turn) -> Vec<Turn> {
        let mut preview: Vec<Turn> = self.iter().cloned().collect();
        preview.push(turn);
        let excess = preview.len().saturating_sub(MAX_HISTORY);
        preview.drain(..excess);
        preview
    }
}
