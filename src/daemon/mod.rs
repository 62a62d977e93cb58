mod app;
mod dbus;
pub mod polling;

use anyhow::Result;

pub use app::build_orchestrator;

pub const DBUS_NAME: &str = "io.github.livewatch.Daemon";
pub const DBUS_PATH: &str = "/io/github/livewatch/Daemon";

pub async fn run(dbus: bool) -> Result<()> {
    tracing::info!("Starting livewatch daemon");
    app::run(dbus).await
}
