use crate::api::{HelixClient, TokenCache};
use crate::core::settings::Settings;
use crate::core::store::StateStore;
use crate::daemon::dbus::start_dbus_server;
use crate::daemon::polling::{run_polling_loop, PollOrchestrator};
use crate::delivery::DiscordDelivery;
use crate::notify::NotificationBatcher;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Builds the poll pipeline from settings and the persisted state file.
pub fn build_orchestrator(settings: &Settings) -> Result<PollOrchestrator> {
    settings.validate()?;

    let client = settings.http.client()?;
    let helix = Arc::new(HelixClient::new(&settings.twitch, client.clone()));
    let delivery = Arc::new(DiscordDelivery::new(&settings.discord, client));

    let state_path = StateStore::default_path().context("Could not determine data directory")?;
    let store = StateStore::open(state_path)?;

    Ok(PollOrchestrator::new(
        TokenCache::new(helix.clone()),
        helix,
        delivery,
        NotificationBatcher::new(settings.polling.detail_cap, settings.polling.body_budget),
        store,
    ))
}

pub async fn run(dbus: bool) -> Result<()> {
    let settings = Settings::load()?;
    let orchestrator = Arc::new(build_orchestrator(&settings)?);

    let _dbus_connection = if dbus {
        Some(start_dbus_server(Arc::clone(&orchestrator)).await?)
    } else {
        tracing::info!("D-Bus interface disabled");
        None
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let polling = tokio::spawn(run_polling_loop(
        Arc::clone(&orchestrator),
        settings.polling.interval(),
        shutdown_rx,
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested");

    let _ = shutdown_tx.send(());
    polling.await.context("Polling task failed")?;
    Ok(())
}
