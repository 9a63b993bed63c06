//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::llm::LlmError;
use crate::reply::Menu;
use crate::system_prompt::Prompt;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued replies
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    delay: Duration,
    /// Record of all prompts received
    pub prompts: Mutex<Vec<Prompt>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Simulate a slow provider
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

/// What the runtime asked the transport to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Text {
        target: ReplyTarget,
        text: String,
    },
    Menu {
        target: ReplyTarget,
        menu: Menu,
    },
    Typing {
        chat_id: i64,
    },
}

/// Sink that records every delivery; optionally fails all text sends
#[derive(Default)]
pub struct RecordingSink {
    pub deliveries: Mutex<Vec<Delivery>>,
    fail_text: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            fail_text: true,
        }
    }

    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.deliveries.lock().unwrap())
    }

    /// Text bodies only, in order
    pub fn texts(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter_map(|d| match d {
                Delivery::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn menus(&self) -> Vec<Menu> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter_map(|d| match d {
                Delivery::Menu { menu, .. } => Some(menu.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl OutboundSink for RecordingSink {
    async fn send_text(&self, target: &ReplyTarget, text: &str) -> Result<(), String> {
        self.deliveries.lock().unwrap().push(Delivery::Text {
            target: target.clone(),
            text: text.to_string(),
        });
        if self.fail_text {
            return Err("chat not found".to_string());
        }
        Ok(())
    }

    async fn send_menu(&self, target: &ReplyTarget, menu: &Menu) -> Result<(), String> {
        self.deliveries.lock().unwrap().push(Delivery::Menu {
            target: target.clone(),
            menu: menu.clone(),
        });
        Ok(())
    }

    async fn send_typing(&self, target: &ReplyTarget) -> Result<(), String> {
        self.deliveries.lock().unwrap().push(Delivery::Typing {
            chat_id: target.chat_id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::llm::LlmErrorKind;
    use crate::reply::CHUNK_SIZE;
    use crate::runtime::{ChatRuntime, DispatchError, Dispatcher};
    use crate::session::{SessionStore, UserId, MAX_HISTORY};
    use crate::state_machine::ChatState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    type TestRuntime = ChatRuntime<Arc<MockLlmClient>, Arc<RecordingSink>>;

    const CHAT: i64 = 555;

    fn setup() -> (TestRuntime, Arc<MockLlmClient>, Arc<RecordingSink>) {
        setup_with(MockLlmClient::new(), RecordingSink::new())
    }

    fn setup_with(
        llm: MockLlmClient,
        sink: RecordingSink,
    ) -> (TestRuntime, Arc<MockLlmClient>, Arc<RecordingSink>) {
        let llm = Arc::new(llm);
        let sink = Arc::new(sink);
        let runtime = ChatRuntime::new(
            SessionStore::default(),
            llm.clone(),
            sink.clone(),
            StdRng::seed_from_u64(7),
        );
        (runtime, llm, sink)
    }

    fn inbound(user: i64, kind: InboundKind) -> InboundEvent {
        InboundEvent {
            user_id: UserId(user),
            target: ReplyTarget::chat(CHAT),
            kind,
        }
    }

    fn text(user: i64, body: &str) -> InboundEvent {
        inbound(user, InboundKind::Text(body.to_string()))
    }

    fn select(user: i64, payload: &str) -> InboundEvent {
        InboundEvent {
            user_id: UserId(user),
            target: ReplyTarget {
                chat_id: CHAT,
                origin_message_id: Some(99),
            },
            kind: InboundKind::Selection(payload.to_string()),
        }
    }

    async fn start_chatting(runtime: &TestRuntime, user: i64, lang: &str, cuisine: &str) {
        runtime.handle(inbound(user, InboundKind::Start)).await;
        runtime.handle(select(user, &format!("lang:{lang}"))).await;
        runtime.handle(select(user, &format!("cuisine:{cuisine}"))).await;
    }

    #[tokio::test]
    async fn test_onboarding_flow() {
        let (runtime, _llm, sink) = setup();

        runtime.handle(inbound(1, InboundKind::Start)).await;
        runtime.handle(select(1, "lang:en")).await;
        runtime.handle(select(1, "cuisine:turkish")).await;

        assert_eq!(sink.menus().len(), 2);
        let deliveries = sink.take();
        assert_eq!(deliveries.len(), 3);

        let Delivery::Menu { target, menu } = &deliveries[0] else {
            panic!("expected language menu, got {deliveries:?}");
        };
        assert_eq!(target.origin_message_id, None);
        assert_eq!(menu.prompt, catalog::WELCOME_TEXT);
        assert_eq!(menu.options.len(), 10);

        // Button presses replace the message that carried the buttons
        let Delivery::Menu { target, menu } = &deliveries[1] else {
            panic!("expected cuisine menu, got {deliveries:?}");
        };
        assert_eq!(target.origin_message_id, Some(99));
        assert_eq!(menu.options.len(), 15);
        assert_eq!(menu.rows().count(), 8);

        let Delivery::Text { target, text } = &deliveries[2] else {
            panic!("expected ready text, got {deliveries:?}");
        };
        assert_eq!(target.origin_message_id, Some(99));
        assert!(text.contains("Turkish"));

        let handle = runtime.store().get_or_create(UserId(1)).await;
        let session = handle.lock().await;
        assert_eq!(session.language_code(), "en");
        assert_eq!(session.cuisine().unwrap().id, "turkish");
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_profanity_gets_italian_deflection() {
        let (runtime, llm, sink) = setup();
        start_chatting(&runtime, 2, "it", "italian").await;
        sink.take();

        runtime.handle(text(2, "che merda di ricetta")).await;

        let texts = sink.texts();
        assert_eq!(texts.len(), 1);
        let italian = catalog::language_by_code("it").unwrap();
        assert!(italian.profanity_replies().contains(&texts[0].as_str()));
        assert!(llm.recorded_prompts().is_empty());

        let handle = runtime.store().get_or_create(UserId(2)).await;
        let session = handle.lock().await;
        assert!(session.history().is_empty());
        assert_eq!(session.turn_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_round_trip() {
        let (runtime, llm, sink) = setup();
        start_chatting(&runtime, 3, "en", "turkish").await;
        sink.take();

        llm.queue_reply("Soak the bulgur, then knead with the meat.");
        runtime.handle(text(3, "Recipe for icli kofte for 8")).await;

        let deliveries = sink.take();
        assert_eq!(deliveries[0], Delivery::Typing { chat_id: CHAT });
        assert_eq!(
            deliveries[1],
            Delivery::Text {
                target: ReplyTarget::chat(CHAT),
                text: "Soak the bulgur, then knead with the meat.".to_string(),
            }
        );

        let prompts = llm.recorded_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].system.contains("for 8 servings"));
        assert!(prompts[0].system.contains("Speak ONLY in English"));
        assert_eq!(prompts[0].history.last().unwrap().text, "Recipe for icli kofte for 8");

        let handle = runtime.store().get_or_create(UserId(3)).await;
        let session = handle.lock().await;
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_history_evicts_oldest_after_ten_entries() {
        let (runtime, llm, _sink) = setup();
        start_chatting(&runtime, 4, "en", "greek").await;

        for i in 0..6 {
            llm.queue_reply(format!("answer {i}"));
            runtime.handle(text(4, &format!("question {i}"))).await;
        }

        let handle = runtime.store().get_or_create(UserId(4)).await;
        let session = handle.lock().await;
        assert_eq!(session.history().len(), MAX_HISTORY);
        let first = session.history().iter().next().unwrap();
        assert_eq!(first.text, "question 1");
        assert_eq!(session.turn_count(), 6);

        // The last prompt held the ten most recent turns ending on the new question
        let prompts = llm.recorded_prompts();
        let last = prompts.last().unwrap();
        assert_eq!(last.history.len(), MAX_HISTORY);
        assert_eq!(last.history.last().unwrap().text, "question 5");
    }

    #[tokio::test]
    async fn test_generation_failure_sends_apology_only() {
        let (runtime, llm, sink) = setup();
        start_chatting(&runtime, 5, "en", "french").await;
        sink.take();

        llm.queue_error(LlmError::rate_limit("quota exceeded"));
        runtime.handle(text(5, "Coq au vin please")).await;

        assert_eq!(sink.texts(), vec![catalog::TECHNICAL_ISSUE]);

        let handle = runtime.store().get_or_create(UserId(5)).await;
        let session = handle.lock().await;
        assert!(session.history().is_empty());
        assert_eq!(session.turn_count(), 0);
        assert!(matches!(session.state, ChatState::Chatting { .. }));
    }

    #[tokio::test]
    async fn test_long_reply_is_chunked() {
        let (runtime, llm, sink) = setup();
        start_chatting(&runtime, 6, "en", "indian").await;
        sink.take();

        llm.queue_reply("x".repeat(9000));
        runtime.handle(text(6, "Explain every masala")).await;

        let texts = sink.texts();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0].chars().count(), CHUNK_SIZE);
        assert_eq!(texts.concat().len(), 9000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunk_delay_between_pieces() {
        let (runtime, llm, sink) = setup();
        let runtime = runtime.with_chunk_delay(Duration::from_millis(500));
        start_chatting(&runtime, 7, "en", "indian").await;
        sink.take();

        llm.queue_reply("y".repeat(8000));
        let start = tokio::time::Instant::now();
        runtime.handle(text(7, "Long answer")).await;

        assert_eq!(sink.texts().len(), 3);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_state_change() {
        let (runtime, llm, _sink) = setup_with(MockLlmClient::new(), RecordingSink::failing());
        start_chatting(&runtime, 8, "en", "mexican").await;

        llm.queue_reply("Tortillas first.");
        runtime.handle(text(8, "Tacos al pastor")).await;

        let handle = runtime.store().get_or_create(UserId(8)).await;
        let session = handle.lock().await;
        assert_eq!(session.cuisine().unwrap().id, "mexican");
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let (runtime, llm, _sink) = setup();
        start_chatting(&runtime, 10, "tr", "turkish").await;
        start_chatting(&runtime, 11, "ru", "russian").await;

        llm.queue_reply("Borscht needs beets.");
        runtime.handle(text(11, "Borscht")).await;

        let a = runtime.store().get_or_create(UserId(10)).await;
        let b = runtime.store().get_or_create(UserId(11)).await;
        assert!(a.lock().await.history().is_empty());
        assert_eq!(b.lock().await.history().len(), 2);
        assert_eq!(a.lock().await.language_code(), "tr");
        assert_eq!(runtime.store().len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatcher_serializes_per_user() {
        let llm = MockLlmClient::new().with_delay(Duration::from_secs(2));
        let (runtime, llm, _sink) = setup_with(llm, RecordingSink::new());
        let runtime = Arc::new(runtime);
        start_chatting(&runtime, 12, "en", "japanese").await;

        let dispatcher = Dispatcher::new(runtime.clone(), CancellationToken::new());
        llm.queue_reply("first");
        llm.queue_reply("second");
        dispatcher.dispatch(text(12, "Ramen broth")).await.unwrap();
        dispatcher.dispatch(text(12, "Tonkotsu or shoyu")).await.unwrap();
        dispatcher.shutdown().await;

        // The second prompt already saw the first exchange
        let prompts = llm.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[1].history.len(), 3);
        assert_eq!(prompts[1].history[1].text, "first");
    }

    #[tokio::test(start_paused = true)]
    async fn test_backlogged_user_does_not_hold_up_others() {
        let llm = MockLlmClient::new().with_delay(Duration::from_secs(30));
        let (runtime, llm, sink) = setup_with(llm, RecordingSink::new());
        start_chatting(&runtime, 14, "en", "italian").await;
        sink.take();

        let dispatcher = Dispatcher::new(Arc::new(runtime), CancellationToken::new());
        let mut refused = 0;
        for i in 0..40 {
            match dispatcher.dispatch(text(14, &format!("risotto step {i}"))).await {
                Ok(()) => {}
                Err(DispatchError::QueueFull(user)) => {
                    assert_eq!(user, UserId(14));
                    refused += 1;
                }
                Err(e) => panic!("unexpected dispatch error: {e}"),
            }
        }
        assert!(refused >= 7, "only {refused} events refused");

        // Another user is served while the first one waits on generation
        dispatcher.dispatch(inbound(15, InboundKind::Start)).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while sink.menus().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(sink.menus()[0].prompt, catalog::WELCOME_TEXT);
        assert!(llm.recorded_prompts().len() <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_worker_exits_and_restarts() {
        let (runtime, llm, sink) = setup();
        start_chatting(&runtime, 16, "en", "chinese").await;
        sink.take();

        let dispatcher = Dispatcher::new(Arc::new(runtime), CancellationToken::new());
        llm.queue_reply("Wok hot, oil shimmering.");
        dispatcher.dispatch(text(16, "Kung pao")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(dispatcher.active_workers().await, 1);

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert_eq!(dispatcher.active_workers().await, 0);

        llm.queue_reply("Velvet the chicken first.");
        dispatcher.dispatch(text(16, "Cashew stir fry")).await.unwrap();
        dispatcher.shutdown().await;

        let prompts = llm.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        // The restarted worker continues the same session
        assert_eq!(prompts[1].history.len(), 3);
        assert_eq!(
            sink.texts(),
            vec!["Wok hot, oil shimmering.", "Velvet the chicken first."]
        );
    }

    #[tokio::test]
    async fn test_timeout_error_kind_is_reported_as_failure() {
        let (runtime, llm, sink) = setup();
        start_chatting(&runtime, 13, "es", "spanish").await;
        sink.take();

        let err = LlmError::timeout("No response within 60s");
        assert_eq!(err.kind, LlmErrorKind::Timeout);
        llm.queue_error(err);
        runtime.handle(text(13, "Paella valenciana")).await;

        assert_eq!(sink.texts(), vec![catalog::TECHNICAL_ISSUE]);
    }
}
