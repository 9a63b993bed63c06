//! Pure state transition function
//!
//! Given a session snapshot and an event, decide the next state and the
//! effects to run. Nothing here touches the network or the store.

use super::{ChatState, Effect, Event, GenerationRequest};
use crate::catalog::{self, Cuisine, Selection};
use crate::classify;
use crate::reply::split_reply;
use crate::session::Session;
use crate::system_prompt::build_prompt;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// `rng` picks among equivalent canned replies; pass a seeded generator for
/// reproducible output.
pub fn transition<R: Rng + ?Sized>(
    session: &Session,
    event: Event,
    rng: &mut R,
) -> Result<TransitionResult, TransitionError> {
    let state = session.state;
    match (state, event) {
        (_, Event::Start) => Ok(TransitionResult::new(ChatState::AwaitingLanguage)
            .with_effect(Effect::send_menu(catalog::language_menu(
                catalog::WELCOME_TEXT,
            )))),

        (_, Event::Selection { payload }) => Ok(handle_selection(session, &payload)),

        (ChatState::Chatting { cuisine }, Event::UserText { text }) => {
            Ok(handle_chat_text(session, cuisine, text, rng))
        }

        // Text before a cuisine is chosen
        (_, Event::UserText { .. }) => Ok(TransitionResult::new(state)
            .with_effect(Effect::send_text(catalog::SELECT_CUISINE_FIRST))),

        (ChatState::Chatting { .. }, Event::GenerationComplete { user_text, reply }) => {
            let chunks = split_reply(&reply);
            Ok(TransitionResult::new(state)
                .with_effect(Effect::RecordExchange {
                    user: user_text,
                    assistant: reply,
                })
                .with_effect(Effect::CountTurn)
                .with_effect(Effect::SendChunks(chunks)))
        }

        // Nothing is recorded, so a retry starts from a clean context
        (ChatState::Chatting { .. }, Event::GenerationFailed { .. }) => Ok(TransitionResult::new(
            state,
        )
        .with_effect(Effect::send_text(catalog::TECHNICAL_ISSUE))),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {}",
            state.name(),
            event.name()
        ))),
    }
}

fn handle_selection(session: &Session, payload: &str) -> TransitionResult {
    let state = session.state;
    match (state, catalog::parse_selection(payload)) {
        (_, Ok(Selection::Language(language))) => {
            TransitionResult::new(ChatState::AwaitingCuisine)
                .with_effect(Effect::SetLanguage(language))
                .with_effect(Effect::send_menu(catalog::cuisine_menu(
                    language.cuisine_prompt(),
                )))
        }

        (
            ChatState::AwaitingCuisine | ChatState::Chatting { .. },
            Ok(Selection::Cuisine(cuisine)),
        ) => TransitionResult::new(ChatState::Chatting { cuisine })
            .with_effect(Effect::ClearHistory)
            .with_effect(Effect::send_text(session.language.ready_text(cuisine))),

        // A language has to be picked before a cuisine
        (ChatState::AwaitingLanguage, Ok(Selection::Cuisine(_))) => {
            TransitionResult::new(state).with_effect(reprompt(session))
        }

        // Stale or forged button while chatting
        (ChatState::Chatting { .. }, Err(_)) => TransitionResult::new(state),

        (_, Err(_)) => TransitionResult::new(state).with_effect(reprompt(session)),
    }
}

/// The menu the user is expected to answer in the current state
fn reprompt(session: &Session) -> Effect {
    match session.state {
        ChatState::AwaitingCuisine => Effect::send_menu(catalog::cuisine_menu(
            session.language.cuisine_prompt(),
        )),
        ChatState::AwaitingLanguage | ChatState::Chatting { .. } => {
            Effect::send_menu(catalog::language_menu(catalog::CHOOSE_LANGUAGE))
        }
    }
}

fn handle_chat_text<R: Rng + ?Sized>(
    session: &Session,
    cuisine: &'static Cuisine,
    text: String,
    rng: &mut R,
) -> TransitionResult {
    if classify::wants_cuisine_change(&text) {
        return TransitionResult::new(ChatState::AwaitingCuisine).with_effect(Effect::send_menu(
            catalog::cuisine_menu(catalog::CHOOSE_NEW_CUISINE),
        ));
    }

    if classify::wants_language_change(&text) {
        return TransitionResult::new(ChatState::AwaitingLanguage).with_effect(
            Effect::send_menu(catalog::language_menu(catalog::CHOOSE_LANGUAGE)),
        );
    }

    let language = session.language;
    let result =
        TransitionResult::new(ChatState::Chatting { cuisine }).with_effect(Effect::ShowTyping);

    if classify::is_profane(&text, language.code) {
        let reply = language
            .profanity_replies()
            .choose(rng)
            .copied()
            .unwrap_or_default();
        return result.with_effect(Effect::send_text(reply));
    }

    // Only the very first exchange gets the pleasantries reply
    if classify::is_greeting(&text) && session.turn_count() == 0 {
        return result
            .with_effect(Effect::send_text(language.no_greeting()))
            .with_effect(Effect::CountTurn);
    }

    let servings = classify::detect_serving_size(&text);
    let prompt = build_prompt(language, cuisine, servings, session.history(), &text);
    result.with_effect(Effect::RequestGeneration(GenerationRequest {
        user_text: text,
        prompt,
    }))
}
