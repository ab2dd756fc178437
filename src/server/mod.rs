//! # Control Server Module
//!
//! Local server that owns the receiver session and its trunk config.
//!
//! This module handles:
//! - Request handlers shared by both front ends ([`SessionController`])
//! - The HTTP/JSON control surface
//! - The raw TCP line-command surface
//! - Running both until shutdown

pub mod controller;
pub mod http;
pub mod line;

pub use controller::SessionController;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::Result;

/// Bind the configured front ends and serve until `cancel` fires
///
/// # Errors
///
/// Returns error if a listener cannot be bound or a front end fails.
pub async fn run(
    config: &ServerConfig,
    controller: Arc<SessionController>,
    cancel: CancellationToken,
) -> Result<()> {
    let http_listener = TcpListener::bind((config.bind_address.as_str(), config.http_port)).await?;

    let token = cancel.clone();
    let http = http::serve(http_listener, controller.clone(), async move {
        token.cancelled().await;
    });

    if !config.line_enabled {
        info!("Line command server disabled");
        return http.await;
    }

    let line_listener = TcpListener::bind((config.bind_address.as_str(), config.line_port)).await?;
    let line = line::serve(line_listener, controller, config.line_read_timeout(), cancel);

    tokio::try_join!(http, line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockVolumeControl;
    use crate::client::LineClient;
    use crate::config::Config;
    use crate::session::MockSessionManager;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_default_client_reaches_default_server() {
        let mut config = Config::default();
        config.server.bind_address = "127.0.0.1".to_string();
        config.client.command_host = "127.0.0.1".to_string();

        let controller = Arc::new(SessionController::new(
            &config,
            Arc::new(MockSessionManager::new()),
            Arc::new(MockVolumeControl::new()),
        ));
        let cancel = CancellationToken::new();
        let server = tokio::spawn({
            let server_config = config.server.clone();
            let cancel = cancel.clone();
            async move { run(&server_config, controller, cancel).await }
        });

        let client = LineClient::new(&config.client);
        let mut attempts = 0;
        let reply = loop {
            let reply = client.hello().await;
            attempts += 1;
            if reply.contains("HELLO") || attempts == 50 {
                break reply;
            }
            sleep(Duration::from_millis(20)).await;
        };
        assert_eq!(reply, "ACK: HELLO");

        cancel.cancel();
        assert!(server.await.unwrap().is_ok());
    }
}
