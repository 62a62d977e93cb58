use crate::core::settings::Settings;
use crate::daemon::{build_orchestrator, DBUS_NAME, DBUS_PATH};
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub enum Control {
    PollNow,
    SetEnabled(bool),
    SetChannel(String),
    SetGame(String),
}

pub async fn run(control: Control, offline: bool) -> Result<()> {
    let reply = if offline {
        run_offline(control).await?
    } else {
        run_via_dbus(control).await?
    };
    println!("{reply}");
    Ok(())
}

async fn run_via_dbus(control: Control) -> Result<String> {
    let connection = zbus::Connection::session()
        .await
        .context("Failed to connect to session D-Bus")?;

    let (method, reply) = match &control {
        Control::PollNow => ("PollNow", call_string(&connection, "PollNow", &()).await?),
        Control::SetEnabled(enabled) => {
            call_unit(&connection, "SetEnabled", &(*enabled,)).await?;
            ("SetEnabled", enabled_reply(*enabled))
        }
        Control::SetChannel(channel_id) => {
            call_unit(&connection, "SetChannel", &(channel_id.as_str(),)).await?;
            ("SetChannel", format!("Channel set to {channel_id}"))
        }
        Control::SetGame(name) => (
            "SetGame",
            call_string(&connection, "SetGame", &(name.as_str(),)).await?,
        ),
    };

    tracing::debug!(method, "D-Bus call completed");
    Ok(reply)
}

async fn call_unit<B>(connection: &zbus::Connection, method: &str, body: &B) -> Result<()>
where
    B: serde::Serialize + zbus::zvariant::DynamicType,
{
    let _reply: () = connection
        .call_method(Some(DBUS_NAME), DBUS_PATH, Some(DBUS_NAME), method, body)
        .await
        .with_context(|| format!("Failed to call {method} - is the daemon running?"))?
        .body()
        .deserialize()
        .context("Failed to deserialize response")?;
    Ok(())
}

async fn call_string<B>(connection: &zbus::Connection, method: &str, body: &B) -> Result<String>
where
    B: serde::Serialize + zbus::zvariant::DynamicType,
{
    let reply: String = connection
        .call_method(Some(DBUS_NAME), DBUS_PATH, Some(DBUS_NAME), method, body)
        .await
        .with_context(|| format!("Failed to call {method} - is the daemon running?"))?
        .body()
        .deserialize()
        .context("Failed to deserialize response")?;
    Ok(reply)
}

/// Applies the change straight to the state file. A running daemon only
/// picks it up after a restart.
async fn run_offline(control: Control) -> Result<String> {
    let settings = Settings::load()?;
    let orchestrator = build_orchestrator(&settings)?;

    match control {
        Control::PollNow => {
            let outcome = orchestrator.tick().await?;
            Ok(outcome.to_string())
        }
        Control::SetEnabled(enabled) => {
            orchestrator.set_enabled(enabled).await?;
            Ok(enabled_reply(enabled))
        }
        Control::SetChannel(channel_id) => {
            orchestrator.set_channel(channel_id.clone()).await?;
            Ok(format!("Channel set to {channel_id}"))
        }
        Control::SetGame(name) => {
            let choice = orchestrator.select_category(&name).await?;
            Ok(choice.describe(&name))
        }
    }
}

fn enabled_reply(enabled: bool) -> String {
    if enabled { "Enabled" } else { "Disabled" }.to_string()
}
