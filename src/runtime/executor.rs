//! Conversation runtime executor

use super::traits::{InboundEvent, InboundKind, LlmClient, OutboundSink, ReplyTarget};
use crate::reply::Outbound;
use crate::session::{Session, SessionStore};
use crate::state_machine::{transition, Effect, Event, GenerationRequest, TransitionError};
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Generic chat runtime that can work with any LLM and delivery implementations
pub struct ChatRuntime<L, O>
where
    L: LlmClient + 'static,
    O: OutboundSink + 'static,
{
    store: SessionStore,
    llm_client: Arc<L>,
    sink: Arc<O>,
    /// Source for canned-reply selection; shared by all users
    rng: Mutex<StdRng>,
    /// Pause between pieces of a split reply
    chunk_delay: Duration,
}

impl<L, O> ChatRuntime<L, O>
where
    L: LlmClient + 'static,
    O: OutboundSink + 'static,
{
    pub fn new(store: SessionStore, llm_client: L, sink: O, rng: StdRng) -> Self {
        Self {
            store,
            llm_client: Arc::new(llm_client),
            sink: Arc::new(sink),
            rng: Mutex::new(rng),
            chunk_delay: Duration::ZERO,
        }
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Process one inbound event to completion.
    ///
    /// The user's session stays locked for the whole call, including any
    /// generation round trip, so a user's events are handled one at a time.
    pub async fn handle(&self, inbound: InboundEvent) {
        let InboundEvent {
            user_id,
            mut target,
            kind,
        } = inbound;

        let handle = self.store.get_or_create(user_id).await;
        let mut session = handle.lock().await;
        session.last_active = self.store.now();

        let event = match kind {
            InboundKind::Start => Event::Start,
            InboundKind::Text(text) => Event::UserText { text },
            InboundKind::Selection(payload) => Event::Selection { payload },
        };

        if let Err(e) = self.process_event(&mut session, &mut target, event).await {
            tracing::error!(user_id = %user_id, error = %e, "Error handling event");
        }
    }

    async fn process_event(
        &self,
        session: &mut Session,
        target: &mut ReplyTarget,
        event: Event,
    ) -> Result<(), TransitionError> {
        // Generation results come back as follow-up events
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();
            let result = {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                transition(session, current_event, &mut *rng)?
            };

            let old_state = std::mem::replace(&mut session.state, result.new_state);
            if old_state != session.state {
                tracing::info!(
                    user_id = %session.user_id,
                    session_age_secs = (session.last_active - session.created_at).num_seconds(),
                    from = old_state.name(),
                    to = session.state.name(),
                    event = event_name,
                    "State transition"
                );
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(session, target, effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(
        &self,
        session: &mut Session,
        target: &mut ReplyTarget,
        effect: Effect,
    ) -> Option<Event> {
        if session.apply(&effect) {
            return None;
        }

        match effect {
            Effect::Send(Outbound::Text(text)) => {
                let result = self.sink.send_text(target, &text).await;
                delivered(session, target, result);
                None
            }
            Effect::Send(Outbound::Menu(menu)) => {
                let result = self.sink.send_menu(target, &menu).await;
                delivered(session, target, result);
                None
            }
            Effect::SendChunks(chunks) => {
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 && !self.chunk_delay.is_zero() {
                        tokio::time::sleep(self.chunk_delay).await;
                    }
                    let result = self.sink.send_text(target, chunk).await;
                    delivered(session, target, result);
                }
                None
            }
            Effect::ShowTyping => {
                if let Err(e) = self.sink.send_typing(target).await {
                    tracing::debug!(
                        user_id = %session.user_id,
                        error = %e,
                        "Typing indicator failed"
                    );
                }
                None
            }
            Effect::RequestGeneration(request) => Some(self.generate(session, request).await),
            Effect::SetLanguage(_)
            | Effect::ClearHistory
            | Effect::RecordExchange { .. }
            | Effect::CountTurn => None,
        }
    }

    async fn generate(&self, session: &Session, request: GenerationRequest) -> Event {
        let start = Instant::now();
        let result = self.llm_client.generate(&request.prompt).await;
        let duration = start.elapsed();

        match result {
            Ok(reply) => {
                tracing::info!(
                    user_id = %session.user_id,
                    model = %self.llm_client.model_id(),
                    cuisine = session.cuisine().map_or("", |c| c.id),
                    language = session.language_code(),
                    duration_ms = %duration.as_millis(),
                    chars = reply.chars().count(),
                    "Generated reply"
                );
                Event::GenerationComplete {
                    user_text: request.user_text,
                    reply,
                }
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %session.user_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Generation failed"
                );
                Event::GenerationFailed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Log a failed delivery. Only the first message after a button press
/// replaces the button's message.
fn delivered(session: &Session, target: &mut ReplyTarget, result: Result<(), String>) {
    if let Err(e) = result {
        tracing::warn!(
            user_id = %session.user_id,
            chat_id = target.chat_id,
            error = %e,
            "Failed to deliver reply"
        );
    }
    target.origin_message_id = None;
}
