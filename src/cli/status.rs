use crate::core::settings::Settings;
use crate::core::store::{read_state, PollState, StateStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct StatusOutput {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    game: Option<GameStatus>,
    interval_mins: u64,
    detail_cap: usize,
    credentials: CredentialStatus,
    config_path: String,
    state_path: String,
}

#[derive(Serialize)]
struct GameStatus {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Serialize)]
struct CredentialStatus {
    twitch: bool,
    discord: bool,
}

pub async fn run(json: bool) -> Result<()> {
    let config_path = Settings::config_path().context("Could not determine config directory")?;
    let state_path = StateStore::default_path().context("Could not determine data directory")?;

    let settings = Settings::load()?;
    let state = read_state(&state_path)?;
    let output = build_status(&settings, state, &config_path, &state_path);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text_output(&output);
    }

    Ok(())
}

fn build_status(
    settings: &Settings,
    state: PollState,
    config_path: &Path,
    state_path: &Path,
) -> StatusOutput {
    let game = state.game_id.map(|id| GameStatus {
        id,
        name: state.game_name,
    });

    StatusOutput {
        enabled: state.enabled,
        channel_id: state.channel_id,
        game,
        interval_mins: settings.polling.interval_mins,
        detail_cap: settings.polling.detail_cap,
        credentials: CredentialStatus {
            twitch: !settings.twitch.client_id.is_empty()
                && !settings.twitch.client_secret.is_empty(),
            discord: !settings.discord.bot_token.is_empty(),
        },
        config_path: config_path.display().to_string(),
        state_path: state_path.display().to_string(),
    }
}

fn print_text_output(status: &StatusOutput) {
    println!(
        "Polling:  {}",
        if status.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "Channel:  {}",
        status.channel_id.as_deref().unwrap_or("(not set)")
    );
    match &status.game {
        Some(game) => println!(
            "Game:     {} ({})",
            game.name.as_deref().unwrap_or("unknown"),
            game.id
        ),
        None => println!("Game:     (not set)"),
    }
    println!("Interval: every {}m", status.interval_mins);
    println!(
        "Credentials: twitch {}, discord {}",
        credential_label(status.credentials.twitch),
        credential_label(status.credentials.discord)
    );
    println!();
    println!("Config: {}", status.config_path);
    println!("State:  {}", status.state_path);
}

fn credential_label(present: bool) -> &'static str {
    if present {
        "ok"
    } else {
        "missing"
    }
}
