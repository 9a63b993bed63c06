//! Chef.AI - culinary assistant chat bot
//!
//! A Telegram bot that walks each user through language and cuisine
//! selection, then answers cooking questions through an LLM.

mod catalog;
mod classify;
mod config;
mod llm;
mod reply;
mod runtime;
mod session;
mod state_machine;
mod system_prompt;
mod telegram;

use config::ChefConfig;
use llm::{LlmService, LoggingService, OpenAIService};
use rand::rngs::StdRng;
use rand::SeedableRng;
use runtime::{ChatRuntime, Dispatcher, ServiceLlmClient};
use session::SessionStore;
use std::sync::Arc;
use telegram::TelegramBot;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chef_ai=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChefConfig::from_env()?;

    // Initialize LLM
    let openai = OpenAIService::new(
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.llm.base_url.as_deref(),
    )?;
    let service: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(openai)));
    let llm_client = ServiceLlmClient::new(service, &config.llm);
    tracing::info!(
        model = %config.llm.model,
        max_tokens = config.llm.max_tokens,
        timeout_secs = config.llm.timeout.as_secs(),
        "LLM client initialized"
    );

    // Connect to Telegram
    let bot = Arc::new(TelegramBot::new(&config.telegram_token, config.poll_timeout)?);
    bot.init().await?;

    let rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let runtime = ChatRuntime::new(SessionStore::default(), llm_client, Arc::clone(&bot), rng)
        .with_chunk_delay(config.chunk_delay);

    let shutdown = CancellationToken::new();
    let dispatcher = Dispatcher::new(Arc::new(runtime), shutdown.child_token());

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        });
    }

    tracing::info!("Chef.AI started");
    telegram::run_polling(&bot, &dispatcher, shutdown).await;

    dispatcher.shutdown().await;
    tracing::info!(
        sessions = dispatcher.runtime().store().len().await,
        "Chef.AI stopped"
    );

    Ok(())
}
