mod config;
mod db;
mod errors;
mod generation;
mod intake;
mod jobboard;
mod listener;
mod llm_client;
mod models;
mod routes;
mod settings;
mod state;
mod store;
mod telegram;
mod workflow;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::generation::CoverLetterGenerator;
use crate::jobboard::JobBoardClient;
use crate::listener::{Listener, TelegramSource};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::settings::{load_bot_config, BotSettings};
use crate::state::AppState;
use crate::store::{ApplicationStore, PgStore};
use crate::telegram::{TelegramClient, TelegramNotifier};
use crate::workflow::ApplicationWorkflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Panics in spawned tasks end up in the log instead of only on stderr
    std::panic::set_hook(Box::new(|panic| {
        error!("Panic: {panic}");
    }));

    info!("Starting auto-apply service v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL document store
    let pool = create_pool(&config.database_url).await?;
    let pg_store = PgStore::new(pool);
    pg_store
        .ensure_schema()
        .await
        .context("Failed to create store schema")?;
    let store: Arc<dyn ApplicationStore> = Arc::new(pg_store);

    // Resolve bot settings once; they stay fixed for the life of the process
    let bot_config = load_bot_config(store.as_ref(), Path::new(&config.config_file)).await?;
    let settings = Arc::new(BotSettings::from_config(bot_config));
    info!(
        "Bot settings: {} keyword(s), minimum {} match(es), auto-apply {}",
        settings.matcher.keywords().len(),
        settings.matcher.minimum_matches(),
        if settings.auto_apply { "on" } else { "off" }
    );
    if let Some(missing) = settings.missing_credential() {
        warn!("{}; matching posts will be reported as failures", missing.message());
    }

    // Initialize job board client
    let job_board = JobBoardClient::new(
        &config.jobboard,
        settings.telegram_init_data.clone().unwrap_or_default(),
    )
    .context("Failed to build job board client")?;
    info!("Job board client initialized ({})", config.jobboard.base_url);

    // Initialize LLM client
    let llm = LlmClient::new(
        settings.llm_api_key.clone(),
        config.llm_model.clone(),
        config.jobboard.retry,
    )
    .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm.model());
    let cover_letters = CoverLetterGenerator::new(
        Arc::new(llm),
        settings.prompt_template.clone(),
        settings.expertise.clone(),
    );

    // Initialize Telegram transport
    let telegram = match settings.bot_token.as_deref() {
        Some(token) => Some(
            TelegramClient::new(&config.telegram_api_url, token, config.jobboard.timeout)
                .context("Failed to build Telegram client")?,
        ),
        None => None,
    };
    let notifier = TelegramNotifier::new(telegram.clone(), settings.target_user_id.clone());

    let workflow = ApplicationWorkflow::new(
        settings.clone(),
        Arc::new(job_board),
        cover_letters,
        store.clone(),
        Arc::new(notifier),
    );

    // Start the channel listener
    match telegram {
        Some(client) => {
            let source = Arc::new(TelegramSource::new(client));
            let listener = Listener::new(source, workflow.clone(), store.clone());
            tokio::spawn(listener.run());
            info!("Channel listener started");
        }
        None => warn!("TELEGRAM_BOT_TOKEN not configured, channel listener not started"),
    }

    // Build app state
    let state = AppState { store, workflow };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
