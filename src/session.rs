//! Per-user conversation sessions

mod history;
mod store;

#[cfg(test)]
pub use history::MAX_HISTORY;
pub use history::{History, Turn};
pub use store::SessionStore;

use crate::catalog::{self, Cuisine, Language};
use crate::state_machine::{ChatState, Effect};
use chrono::{DateTime, Utc};
use std::fmt;

/// Messaging-platform user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the bot remembers about one user
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub language: &'static Language,
    pub state: ChatState,
    history: History,
    /// Assistant responses issued so far
    turn_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            language: catalog::default_language(),
            state: ChatState::AwaitingLanguage,
            history: History::new(),
            turn_count: 0,
            created_at: now,
            last_active: now,
        }
    }

    pub fn language_code(&self) -> &'static str {
        self.language.code
    }

    pub fn cuisine(&self) -> Option<&'static Cuisine> {
        self.state.cuisine()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Apply a session-mutating effect.
    ///
    /// Returns `false` for effects that belong to the runtime (replies,
    /// generation requests), leaving the session untouched.
    pub fn apply(&mut self, effect: &Effect) -> bool {
        match effect {
            Effect::SetLanguage(language) => {
                self.language = *language;
            }
            Effect::ClearHistory => self.history.clear(),
            Effect::RecordExchange { user, assistant } => {
                self.history.push(Turn::user(user.clone()));
                self.history.push(Turn::assistant(assistant.clone()));
            }
            Effect::CountTurn => self.turn_count = self.turn_count.saturating_add(1),
            Effect::Send(_)
            | Effect::SendChunks(_)
            | Effect::ShowTyping
            | Effect::RequestGeneration(_) => return false,
        }
        true
    }
}
