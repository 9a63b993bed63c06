//! Telegram Bot API transport
//!
//! Long-polls for updates, converts them into [`InboundEvent`]s for the
//! dispatcher, and implements [`OutboundSink`] for replies.

mod types;

use crate::reply::Menu;
use crate::runtime::{
    Dispatcher, InboundEvent, InboundKind, LlmClient, OutboundSink, ReplyTarget,
};
use crate::session::UserId;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use types::{
    AnswerCallbackQuery, ApiResponse, DeleteWebhook, EditMessageText, GetUpdates,
    InlineKeyboardMarkup, Message, NoParams, SendChatAction, SendMessage, Update, User,
};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Timeout for ordinary method calls
const CALL_TIMEOUT: Duration = Duration::from_secs(30);
/// Extra HTTP slack on top of the long-poll timeout
const POLL_SLACK: Duration = Duration::from_secs(10);
/// Pause after a failed poll
const POLL_BACKOFF: Duration = Duration::from_secs(5);

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request to {method} failed: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned error {code:?}: {description}")]
    Api {
        method: &'static str,
        code: Option<i64>,
        description: String,
    },
    #[error("{method} returned an unreadable response: {message}")]
    Decode {
        method: &'static str,
        message: String,
    },
}

/// Bot API client bound to one token
pub struct TelegramBot {
    client: Client,
    /// `{api_url}/bot{token}`
    base: String,
    poll_timeout: Duration,
}

impl TelegramBot {
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self, TelegramError> {
        Self::with_api_url(DEFAULT_API_URL, token, poll_timeout)
    }

    pub fn with_api_url(
        api_url: &str,
        token: &str,
        poll_timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .build()
            .map_err(|source| TelegramError::Http {
                method: "client",
                source,
            })?;
        Ok(Self {
            client,
            base: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            poll_timeout,
        })
    }

    async fn call<P, R>(
        &self,
        method: &'static str,
        params: &P,
        timeout: Duration,
    ) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.base))
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|source| TelegramError::Http { method, source })?;

        let body = response
            .text()
            .await
            .map_err(|source| TelegramError::Http { method, source })?;

        let envelope: ApiResponse<R> =
            serde_json::from_str(&body).map_err(|e| TelegramError::Decode {
                method,
                message: e.to_string(),
            })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(TelegramError::Api {
                method,
                code: error_code,
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    /// Validate the token and make sure polling is allowed.
    ///
    /// Pending updates are dropped so messages sent while the bot was down
    /// are not replayed.
    pub async fn init(&self) -> Result<User, TelegramError> {
        let me: User = self.call("getMe", &NoParams {}, CALL_TIMEOUT).await?;
        let _: bool = self
            .call(
                "deleteWebhook",
                &DeleteWebhook {
                    drop_pending_updates: true,
                },
                CALL_TIMEOUT,
            )
            .await?;
        tracing::info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or(&me.first_name),
            "Telegram bot authenticated"
        );
        Ok(me)
    }

    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout.as_secs(),
                allowed_updates: ALLOWED_UPDATES,
            },
            self.poll_timeout + POLL_SLACK,
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let _: Message = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text,
                    reply_markup,
                },
                CALL_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        // Returns the edited Message, or `true` for inline messages
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id,
                    message_id,
                    text,
                    reply_markup,
                },
                CALL_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
    ) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery { callback_query_id },
                CALL_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "sendChatAction",
                &SendChatAction { chat_id, action },
                CALL_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    /// Edit the originating message when there is one, otherwise send anew.
    /// A failed edit falls back to a new message.
    async fn deliver(
        &self,
        target: &ReplyTarget,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        if let Some(message_id) = target.origin_message_id {
            match self
                .edit_message_text(target.chat_id, message_id, text, reply_markup)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(
                        chat_id = target.chat_id,
                        error = %e,
                        "Edit failed, sending new message"
                    );
                }
            }
        }
        self.send_message(target.chat_id, text, reply_markup).await
    }
}

#[async_trait]
impl OutboundSink for TelegramBot {
    async fn send_text(&self, target: &ReplyTarget, text: &str) -> Result<(), String> {
        self.deliver(target, text, None)
            .await
            .map_err(|e| e.to_string())
    }

    async fn send_menu(&self, target: &ReplyTarget, menu: &Menu) -> Result<(), String> {
        let markup = InlineKeyboardMarkup::from(menu);
        self.deliver(target, &menu.prompt, Some(&markup))
            .await
            .map_err(|e| e.to_string())
    }

    async fn send_typing(&self, target: &ReplyTarget) -> Result<(), String> {
        self.send_chat_action(target.chat_id, "typing")
            .await
            .map_err(|e| e.to_string())
    }
}

/// Translate an update into a chat event.
///
/// Returns `None` for updates the bot does not act on: commands other than
/// `/start`, non-text messages, messages from bots, and empty callbacks.
/// Whitespace-only text is passed on as an empty query.
pub fn to_inbound(update: &Update) -> Option<InboundEvent> {
    if let Some(query) = &update.callback_query {
        let data = query.data.as_ref()?;
        let target = match &query.message {
            Some(message) => ReplyTarget {
                chat_id: message.chat.id,
                origin_message_id: Some(message.message_id),
            },
            None => ReplyTarget::chat(query.from.id),
        };
        return Some(InboundEvent {
            user_id: UserId(query.from.id),
            target,
            kind: InboundKind::Selection(data.clone()),
        });
    }

    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?.trim();
    let user_id = match &message.from {
        Some(user) if user.is_bot => return None,
        Some(user) => user.id,
        None => message.chat.id,
    };

    let kind = match parse_command(text) {
        Some("start") => InboundKind::Start,
        Some(_) => return None,
        None => InboundKind::Text(text.to_string()),
    };

    Some(InboundEvent {
        user_id: UserId(user_id),
        target: ReplyTarget::chat(message.chat.id),
        kind,
    })
}

/// Command name without the slash or `@botname` suffix
fn parse_command(text: &str) -> Option<&str> {
    let command = text.strip_prefix('/')?.split_whitespace().next()?;
    Some(command.split('@').next().unwrap_or(command))
}

/// Long-poll until cancelled, feeding every update to the dispatcher
pub async fn run_polling<L, O>(
    bot: &TelegramBot,
    dispatcher: &Dispatcher<L, O>,
    cancel: CancellationToken,
) where
    L: LlmClient + 'static,
    O: OutboundSink + 'static,
{
    let mut offset: Option<i64> = None;
    tracing::info!(timeout_secs = bot.poll_timeout.as_secs(), "Polling for updates");

    loop {
        let updates = tokio::select! {
            () = cancel.cancelled() => break,
            result = bot.get_updates(offset) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, backing off");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_BACKOFF) => {}
                }
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            if let Some(query) = &update.callback_query {
                if let Err(e) = bot.answer_callback_query(&query.id).await {
                    tracing::debug!(error = %e, "Failed to answer callback query");
                }
            }

            let Some(event) = to_inbound(&update) else {
                tracing::debug!(update_id = update.update_id, "Ignoring update");
                continue;
            };
            if let Err(e) = dispatcher.dispatch(event).await {
                tracing::warn!(
                    update_id = update.update_id,
                    error = %e,
                    "Dropping update"
                );
            }
        }
    }

    tracing::info!("Polling stopped");
}
