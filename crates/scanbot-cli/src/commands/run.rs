//! Bootstrap: wires the adapters into a [`ScanBot`] and serves chats.

use anyhow::{Context, Result, bail};
use scanbot_application::{DeliveryDispatcher, DuplexMerger, ScanBot, SessionServices};
use scanbot_core::chat::ChatTransport;
use scanbot_core::config::BotConfig;
use scanbot_core::delivery::DocumentStore;
use scanbot_core::scanner::{ScanTarget, ScannerCatalog};
use scanbot_infrastructure::{ConfigService, HttpScanClient, LopdfPageEngine, PaperlessClient};
use scanbot_interaction::TelegramClient;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn execute(path: Option<&Path>) -> Result<()> {
    let config = ConfigService::new()
        .load(path)
        .context("Failed to load configuration")?;
    tracing::info!("[Bootstrap] {:?}", config);

    let telegram = Arc::new(
        TelegramClient::new(
            config.telegram_token.clone(),
            Duration::from_secs(config.poll_timeout_secs),
        )
        .context("Failed to create Telegram client")?,
    );
    let account = telegram
        .get_me()
        .await
        .context("Telegram rejected the bot token")?;
    tracing::info!("[Bootstrap] Authorized on account {}", account);
    tracing::info!("[Bootstrap] Allowed users: {:?}", config.allowed_users);

    let mut bot = build_bot(&config, telegram.clone())?;

    tokio::select! {
        _ = bot.run(telegram.as_ref()) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            tracing::info!("[Bootstrap] Shutting down");
        }
    }

    Ok(())
}

/// Catalog from configuration, without targets that have no backend.
pub fn build_catalog(config: &BotConfig) -> Result<ScannerCatalog> {
    let mut catalog = ScannerCatalog::new(config.functions.clone());
    if config.paperless.is_none() {
        tracing::info!("[Bootstrap] No document store configured; only chat delivery is offered");
        catalog = catalog.without_target(ScanTarget::DocumentStore);
    }
    if catalog.is_empty() {
        bail!("No scan functions left to offer");
    }
    Ok(catalog)
}

pub fn build_bot(config: &BotConfig, transport: Arc<dyn ChatTransport>) -> Result<ScanBot> {
    let catalog = build_catalog(config)?;

    let scanner = HttpScanClient::new(
        config.scanner_endpoint.clone(),
        Duration::from_secs(config.scan_timeout_secs),
    )
    .context("Failed to create scan client")?;

    let store = config.paperless.as_ref().map(|paperless| {
        Arc::new(PaperlessClient::new(
            paperless.endpoint.clone(),
            paperless.token.clone(),
        )) as Arc<dyn DocumentStore>
    });

    let services = SessionServices {
        catalog,
        scanner: Arc::new(scanner),
        merger: DuplexMerger::new(Arc::new(LopdfPageEngine::new())),
        dispatcher: DeliveryDispatcher::new(transport.clone(), store),
        transport,
        device_id: config.scanner_device_id.clone(),
    };

    Ok(ScanBot::new(config.allowed_users.iter().copied(), services))
}
