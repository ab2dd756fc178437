//! # Line Command Transport
//!
//! Short-lived TCP exchanges with the control server: connect, send one
//! command, read one reply, close. Any failure yields [`FAIL_REPLY`].

use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ClientConfig;
use crate::protocol::{LineCommand, ScanMode, TrunkSettings, WhitelistEntry, FAIL_REPLY};

/// Largest reply read from the server
pub const MAX_REPLY_LEN: u64 = 1024;

/// Sender of line commands
#[derive(Debug, Clone)]
pub struct LineClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl LineClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            host: config.command_host.clone(),
            port: config.command_port,
            timeout: config.command_timeout(),
        }
    }

    /// Send raw command text and return the reply, or `"FAIL"`
    pub async fn send(&self, command: &str) -> String {
        match self.exchange(command).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Line command to {}:{} failed: {}", self.host, self.port, e);
                FAIL_REPLY.to_string()
            }
        }
    }

    pub async fn send_command(&self, command: &LineCommand) -> String {
        self.send(&command.to_string()).await
    }

    async fn exchange(&self, command: &str) -> io::Result<String> {
        let mut stream = timeout(self.timeout, TcpStream::connect((self.host.as_str(), self.port))).await??;
        timeout(self.timeout, stream.write_all(command.as_bytes())).await??;

        let mut buf = BytesMut::with_capacity(MAX_REPLY_LEN as usize);
        timeout(self.timeout, (&mut stream).take(MAX_REPLY_LEN).read_buf(&mut buf)).await??;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub async fn hello(&self) -> String {
        self.send_command(&LineCommand::Hello).await
    }

    pub async fn start_receiver(&self) -> String {
        self.send_command(&LineCommand::StartTest).await
    }

    pub async fn stop_receiver(&self) -> String {
        self.send_command(&LineCommand::StopOp25).await
    }

    pub async fn manual_start(&self, sdr: &str, gain: &str) -> String {
        self.send_command(&LineCommand::ManualStart {
            sdr: sdr.to_string(),
            gain: gain.to_string(),
        })
        .await
    }

    /// Current trunk settings; `None` when the reply does not decode
    pub async fn read_trunk(&self) -> Option<TrunkSettings> {
        let reply = self.send_command(&LineCommand::ReadTrunk).await;
        match reply.parse() {
            Ok(settings) => Some(settings),
            Err(e) => {
                debug!("Unusable READ_TRUNK reply {:?}: {}", reply, e);
                None
            }
        }
    }

    pub async fn write_trunk(&self, settings: &TrunkSettings) -> String {
        self.send_command(&LineCommand::WriteTrunk(settings.clone())).await
    }

    pub async fn increase_volume(&self) -> String {
        self.send_command(&LineCommand::IncreaseVolume).await
    }

    pub async fn decrease_volume(&self) -> String {
        self.send_command(&LineCommand::DecreaseVolume).await
    }

    pub async fn write_whitelist(&self, system: &str, entries: &[WhitelistEntry]) -> String {
        self.send_command(&LineCommand::WriteWhitelist {
            system: system.to_string(),
            entries: entries.to_vec(),
        })
        .await
    }

    pub async fn write_scan_mode(&self, system: &str, mode: ScanMode) -> String {
        self.send_command(&LineCommand::WriteScanMode { system: system.to_string(), mode })
            .await
    }

    pub async fn site_lock(&self, system: &str, site: &str) -> String {
        self.send_command(&LineCommand::SiteLock {
            system: system.to_string(),
            site: site.to_string(),
        })
        .await
    }

    pub async fn start_system(&self, site: &str, system: &str) -> String {
        self.send_command(&LineCommand::StartSystem {
            site: site.to_string(),
            system: system.to_string(),
        })
        .await
    }

    pub async fn create_system(&self, username: &str, password: &str, system: &str) -> String {
        self.send_command(&LineCommand::CreateSystem {
            username: username.to_string(),
            password: password.to_string(),
            system: system.to_string(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn client_for(port: u16) -> LineClient {
        let config = ClientConfig {
            command_host: "127.0.0.1".to_string(),
            command_port: port,
            command_timeout_ms: 200,
            ..ClientConfig::default()
        };
        LineClient::new(&config)
    }

    /// Answer one connection with `reply`, returning what was received
    async fn one_shot_server(reply: &'static str) -> (u16, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (port, handle)
    }

    #[tokio::test]
    async fn test_hello_unreachable_is_fail() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        assert_eq!(client_for(port).hello().await, "FAIL");
    }

    #[tokio::test]
    async fn test_silent_server_times_out_to_fail() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        assert_eq!(client_for(port).send("HELLO").await, "FAIL");
    }

    #[tokio::test]
    async fn test_send_returns_reply() {
        let (port, server) = one_shot_server("ACK: HELLO").await;
        assert_eq!(client_for(port).hello().await, "ACK: HELLO");
        assert_eq!(server.await.unwrap(), "HELLO");
    }

    #[tokio::test]
    async fn test_read_trunk_decodes_settings() {
        let (port, _server) = one_shot_server("sysname=Metro;cclist=853.1125;tglist=metro.tsv").await;
        let settings = client_for(port).read_trunk().await.unwrap();
        assert_eq!(settings.sysname, "Metro");
        assert_eq!(settings.tglist, "metro.tsv");
    }

    #[tokio::test]
    async fn test_read_trunk_fail_is_none() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(client_for(port).read_trunk().await.is_none());
    }

    #[tokio::test]
    async fn test_whitelist_wire_format() {
        let (port, server) = one_shot_server("ACK: Whitelist updated").await;
        let entries = vec![
            WhitelistEntry { tgid: 101, label: "Fire".into() },
            WhitelistEntry { tgid: 202, label: "EMS".into() },
        ];
        client_for(port).write_whitelist("3245", &entries).await;
        assert_eq!(server.await.unwrap(), "WRITE_WHITELIST;3245;101:Fire;202:EMS");
    }
}
