use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use cli::control::Control;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod api;
mod cli;
mod core;
mod daemon;
mod delivery;
mod notify;

#[derive(Parser)]
#[command(name = "livewatch")]
#[command(author, version, about = "Announce newly live Twitch streams to a Discord channel")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the polling daemon
    Daemon {
        /// Do not register the D-Bus control interface
        #[arg(long)]
        no_dbus: bool,
    },

    /// Show the persisted polling state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one poll now
    Poll {
        /// Run in this process instead of asking the daemon
        #[arg(long)]
        offline: bool,
    },

    /// Enable polling
    Enable {
        #[arg(long)]
        offline: bool,
    },

    /// Disable polling
    Disable {
        #[arg(long)]
        offline: bool,
    },

    /// Set the Discord channel that receives notifications
    SetChannel {
        channel_id: String,

        #[arg(long)]
        offline: bool,
    },

    /// Set the game to watch, looked up by exact name
    SetGame {
        name: String,

        #[arg(long)]
        offline: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(json: bool) {
    let default_level = match core::settings::Settings::load() {
        Ok(settings) if settings.debug => "debug",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { no_dbus } => {
            init_logging(cli.log_json);
            daemon::run(!no_dbus).await
        }
        Commands::Status { json } => {
            init_logging(cli.log_json);
            cli::status::run(json).await
        }
        Commands::Poll { offline } => {
            init_logging(cli.log_json);
            cli::control::run(Control::PollNow, offline).await
        }
        Commands::Enable { offline } => {
            init_logging(cli.log_json);
            cli::control::run(Control::SetEnabled(true), offline).await
        }
        Commands::Disable { offline } => {
            init_logging(cli.log_json);
            cli::control::run(Control::SetEnabled(false), offline).await
        }
        Commands::SetChannel { channel_id, offline } => {
            init_logging(cli.log_json);
            cli::control::run(Control::SetChannel(channel_id), offline).await
        }
        Commands::SetGame { name, offline } => {
            init_logging(cli.log_json);
            cli::control::run(Control::SetGame(name), offline).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
