use crate::daemon::polling::PollOrchestrator;
use crate::daemon::{DBUS_NAME, DBUS_PATH};
use anyhow::{Context, Result};
use std::sync::Arc;
use zbus::interface;

pub struct LivewatchService {
    orchestrator: Arc<PollOrchestrator>,
}

impl LivewatchService {
    pub fn new(orchestrator: Arc<PollOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[interface(name = "io.github.livewatch.Daemon")]
impl LivewatchService {
    async fn poll_now(&self) -> zbus::fdo::Result<String> {
        tracing::info!("D-Bus PollNow called");
        match self.orchestrator.tick().await {
            Ok(outcome) => Ok(outcome.to_string()),
            Err(e) => Err(zbus::fdo::Error::Failed(e.to_string())),
        }
    }

    async fn set_enabled(&self, enabled: bool) -> zbus::fdo::Result<()> {
        tracing::info!(enabled, "D-Bus SetEnabled called");
        self.orchestrator
            .set_enabled(enabled)
            .await
            .map_err(|e| zbus::fdo::Error::Failed(format!("{e:#}")))
    }

    async fn set_channel(&self, channel_id: String) -> zbus::fdo::Result<()> {
        tracing::info!(%channel_id, "D-Bus SetChannel called");
        self.orchestrator
            .set_channel(channel_id)
            .await
            .map_err(|e| zbus::fdo::Error::Failed(format!("{e:#}")))
    }

    async fn set_game(&self, name: String) -> zbus::fdo::Result<String> {
        tracing::info!(%name, "D-Bus SetGame called");
        let choice = self
            .orchestrator
            .select_category(&name)
            .await
            .map_err(|e| zbus::fdo::Error::Failed(format!("{e:#}")))?;

        Ok(choice.describe(&name))
    }

    #[zbus(property)]
    fn is_polling(&self) -> bool {
        self.orchestrator.is_running()
    }
}

pub async fn start_dbus_server(orchestrator: Arc<PollOrchestrator>) -> Result<zbus::Connection> {
    let connection = zbus::connection::Builder::session()
        .context("Failed to connect to session D-Bus")?
        .name(DBUS_NAME)
        .context("Failed to request D-Bus name")?
        .serve_at(DBUS_PATH, LivewatchService::new(orchestrator))
        .context("Failed to register D-Bus interface")?
        .build()
        .await
        .context("Failed to start D-Bus server")?;

    tracing::info!(name = DBUS_NAME, "D-Bus interface registered");
    Ok(connection)
}
