use anyhow::Result;
use chrono::Utc;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use verifai_ai::{ChatCompleter, DocumentExtractor, Embedder, OpenAiProvider};
use verifai_notify::channels::email::EmailChannel;
use verifai_notify::channels::webhook::WebhookChannel;
use verifai_notify::manager::NotificationManager;
use verifai_risk::workflow::VerificationWorkflow;
use verifai_storage::VerifaiStore;

use verifai_server::app;
use verifai_server::config::{NotifyConfig, ServerConfig, SettingsSeedFile};
use verifai_server::rag::RagService;
use verifai_server::state::AppState;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  verifai-server [config.toml]                                Start the server");
    eprintln!("  verifai-server init-settings <config.toml> <seed.json>      Initialize review settings from seed file");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("verifai=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("init-settings") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-settings requires <config.toml> and <seed.json> arguments")
            })?;
            let seed_path = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-settings requires <seed.json> argument")
            })?;
            run_init_settings(config_path, seed_path).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/server.toml");
            run_server(config_path).await
        }
    }
}

/// Overlay review settings from a JSON seed file onto the stored values.
async fn run_init_settings(config_path: &str, seed_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let store = VerifaiStore::new(&config.connection_url(), Path::new(&config.data_dir)).await?;

    let seed_content = std::fs::read_to_string(seed_path)
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", seed_path, e))?;
    let seed: SettingsSeedFile = serde_json::from_str(&seed_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse seed file '{}': {}", seed_path, e))?;

    let mut settings = store.get_settings().await?;
    seed.apply(&mut settings);
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid settings in seed file '{}': {}", seed_path, e))?;
    let saved = store.replace_settings(&settings).await?;

    tracing::info!(
        auto_approve_threshold = saved.auto_approve_threshold,
        high_risk_threshold = saved.high_risk_threshold,
        email_notifications = saved.email_notifications,
        in_app_notifications = saved.in_app_notifications,
        auto_reject_high_risk = saved.auto_reject_high_risk,
        "init-settings completed"
    );
    Ok(())
}

fn build_notifier(config: &NotifyConfig) -> NotificationManager {
    let mut manager = NotificationManager::new(Vec::new());
    if !config.webhook_urls.is_empty() {
        let timeout = Duration::from_secs(config.webhook_timeout_secs);
        match WebhookChannel::new(config.webhook_urls.clone(), timeout) {
            Ok(channel) => manager.add_channel(Box::new(channel)),
            Err(e) => tracing::error!(error = %e, "Failed to configure webhook channel"),
        }
    }
    if let Some(email) = &config.email {
        match EmailChannel::new(
            &email.smtp_host,
            email.smtp_port,
            email.smtp_username.as_deref(),
            email.smtp_password.as_deref(),
            &email.from_email,
            &email.recipients,
        ) {
            Ok(channel) => manager.add_channel(Box::new(channel)),
            Err(e) => tracing::error!(error = %e, "Failed to configure email channel"),
        }
    }
    manager
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;

    tracing::info!(
        http_port = config.http_port,
        data_dir = %config.data_dir,
        max_batch_documents = config.batch.max_documents,
        "verifai-server starting"
    );

    let store = Arc::new(VerifaiStore::new(&config.connection_url(), Path::new(&config.data_dir)).await?);

    // A single OpenAI-compatible provider serves OCR, embeddings and chat.
    let provider = match config.ai.resolve_api_key() {
        Some(key) => Some(Arc::new(OpenAiProvider::new(key, config.ai.provider_options())?)),
        None => {
            tracing::warn!("No AI API key configured; OCR, chat and knowledge base run in fallback mode");
            None
        }
    };
    let extractor = provider
        .clone()
        .map(|p| p as Arc<dyn DocumentExtractor>);
    let embedder = provider.clone().map(|p| p as Arc<dyn Embedder>);
    let chat = provider.map(|p| p as Arc<dyn ChatCompleter>);

    let notifier = build_notifier(&config.notify);
    tracing::info!(channels = notifier.channel_count(), "Notification channels configured");

    let rag = Arc::new(RagService::new(store.clone(), embedder, chat.clone()));
    if rag.is_available() {
        match rag.seed_fraud_patterns().await {
            Ok(count) => tracing::info!(count, "Fraud pattern knowledge base ready"),
            Err(e) => tracing::error!(error = %e, "Failed to seed fraud patterns"),
        }
    }

    let http_port = config.http_port;
    let state = AppState {
        store,
        extractor,
        chat,
        rag,
        workflow: Arc::new(VerificationWorkflow::standard()),
        notifier: Arc::new(notifier),
        config: Arc::new(config),
        start_time: Utc::now(),
    };

    let http_addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    let app = app::build_http_app(state);
    let http_listener = tokio::net::TcpListener::bind(http_addr).await?;
    tracing::info!(http = %http_addr, "Server started");

    axum::serve(
        http_listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        signal::ctrl_c().await.ok();
    })
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
