//! # OP25 Control
//!
//! Command line front end for the OP25 control library.
//!
//! - `serve` runs the control server next to the receiver
//! - `poll` prints live telemetry as JSON lines
//! - `send` and `control` issue one command and print the reply

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use op25_control::audio::AmixerVolume;
use op25_control::client::{ConnectionEvent, ConnectionStatus, HttpControl, LineClient, Op25Client};
use op25_control::config::{Config, LoggingConfig};
use op25_control::server::{self, SessionController};
use op25_control::session::ScreenSessionManager;

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Parser, Debug)]
#[command(name = "op25-control", version, about = "Remote control for an OP25 trunking receiver")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the control server that owns the receiver session
    Serve,
    /// Poll receiver telemetry and print one JSON line per snapshot
    Poll,
    /// Send one line command (e.g. `READ_TRUNK`) and print the reply
    Send { command: String },
    /// Call the HTTP control surface
    Control {
        #[arg(value_enum)]
        action: ControlAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ControlAction {
    Hello,
    Start,
    Stop,
    Output,
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let _log_guard = init_logging(&config.logging);

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Poll => poll(config).await,
        Command::Send { command } => {
            println!("{}", LineClient::new(&config.client).send(&command).await);
            Ok(())
        }
        Command::Control { action } => {
            let control = HttpControl::new(&config.client)?;
            let reply = match action {
                ControlAction::Hello => control.hello().await,
                ControlAction::Start => control.start_receiver().await,
                ControlAction::Stop => control.stop_receiver().await,
                ControlAction::Output => control.output().await,
                ControlAction::Config => control.config().await,
            };
            println!("{}", reply);
            Ok(())
        }
    }
}

/// Explicit path must exist; the default path falls back to built-in defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH).with_context(|| format!("loading {}", DEFAULT_CONFIG_PATH))
        }
        None => Ok(Config::default()),
    }
}

/// Logs go to stderr, plus a daily rolling file when `log_dir` is set
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "op25-control.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("OP25 Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let sessions = Arc::new(ScreenSessionManager::new(&config.receiver));
    let volume = Arc::new(AmixerVolume::new(&config.audio));
    let controller = Arc::new(SessionController::new(&config, sessions, volume));

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
        }
        signal.cancel();
    });

    server::run(&config.server, controller, cancel)
        .await
        .context("control server failed")?;
    info!("Control server stopped");
    Ok(())
}

async fn poll(config: Config) -> Result<()> {
    let (mut client, mut snapshots) = Op25Client::with_channel(&config.client)?;
    client.start();

    let mut status = ConnectionStatus::default();
    loop {
        tokio::select! {
            snapshot = snapshots.recv() => {
                let Some(snapshot) = snapshot else { break };

                let (next, event) = status.next(client.connection_successful());
                status = next;
                match event {
                    Some(ConnectionEvent::Connected) => info!("Connected to {}", config.client.status_url),
                    Some(ConnectionEvent::Lost) => warn!("Connection to receiver lost"),
                    None => {}
                }

                let line = json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "status": status.to_string(),
                    "signal": snapshot.signal_level(),
                    "talkgroup": snapshot.current_talkgroup(),
                    "snapshot": snapshot,
                });
                println!("{}", line);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::parse_from(["op25-control", "--config", "x.toml", "send", "READ_TRUNK"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Command::Send { command } if command == "READ_TRUNK"));
    }

    #[test]
    fn test_parse_control_action() {
        let cli = Cli::parse_from(["op25-control", "control", "start"]);
        assert!(matches!(cli.command, Command::Control { action: ControlAction::Start }));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/op25.toml"))).is_err());
    }
}
