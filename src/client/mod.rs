//! # Polling Client Module
//!
//! Client side of the receiver: live telemetry plus remote control.
//!
//! This module handles:
//! - A background poll loop fetching telemetry over HTTP ([`Op25Client`])
//! - Handing each snapshot to a callback or channel
//! - Line commands over short-lived TCP connections ([`LineClient`])
//! - The HTTP control surface ([`HttpControl`])
//! - Debounced connection status for display ([`ConnectionStatus`])

pub mod control;
pub mod line;
pub mod status;

pub use control::HttpControl;
pub use line::LineClient;
pub use status::{ConnectionEvent, ConnectionStatus};

use serde_json::json;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::telemetry::{normalize_bytes, TelemetrySnapshot};

/// Delay between start handshake attempts
const HANDSHAKE_RETRY: Duration = Duration::from_secs(1);

/// Receives every snapshot produced by the poll loop
pub type SnapshotCallback = Arc<dyn Fn(TelemetrySnapshot) + Send + Sync>;

/// State shared between the client handle and its poll task
struct Shared {
    config: ClientConfig,
    http: reqwest::Client,
    line: LineClient,
    connected: AtomicBool,
    callback: SnapshotCallback,
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Telemetry poller and line-command sender for one receiver
pub struct Op25Client {
    shared: Arc<Shared>,
    task: Option<PollTask>,
}

impl Op25Client {
    /// Create a client delivering snapshots to `callback`
    ///
    /// The callback runs on the poll task. A panicking callback is logged and
    /// polling continues.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new<F>(config: &ClientConfig, callback: F) -> Result<Self>
    where
        F: Fn(TelemetrySnapshot) + Send + Sync + 'static,
    {
        let http = reqwest::Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config: config.clone(),
                http,
                line: LineClient::new(config),
                connected: AtomicBool::new(false),
                callback: Arc::new(callback),
            }),
            task: None,
        })
    }

    /// Create a client whose snapshots are queued for another task
    ///
    /// For front ends that must handle updates on their own scheduler.
    pub fn with_channel(config: &ClientConfig) -> Result<(Self, mpsc::UnboundedReceiver<TelemetrySnapshot>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Self::new(config, move |snapshot| {
            // Receiver dropped: nobody is listening any more
            let _ = tx.send(snapshot);
        })?;
        Ok((client, rx))
    }

    /// Spawn the poll loop; does nothing if it is already running
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Poll loop already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(self.shared.clone(), cancel.clone()));
        self.task = Some(PollTask { cancel, handle });
        info!("Started polling {}", self.shared.config.status_url);
    }

    /// Cancel the poll loop and wait for it to exit
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            warn!("Poll loop ended abnormally: {}", e);
        }
        info!("Stopped polling");
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.handle.is_finished())
    }

    /// One telemetry fetch, updating the connection flag
    pub async fn fetch_latest(&self) -> TelemetrySnapshot {
        self.shared.fetch_latest().await
    }

    /// Outcome of the most recent telemetry fetch
    pub fn connection_successful(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Send a raw line command; `"FAIL"` if the server is unreachable
    pub async fn send_line_command(&self, command: &str) -> String {
        self.shared.line.send(command).await
    }

    /// Typed line commands to the same server
    pub fn line(&self) -> &LineClient {
        &self.shared.line
    }
}

impl Drop for Op25Client {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.cancel.cancel();
        }
    }
}

impl Shared {
    async fn fetch_latest(&self) -> TelemetrySnapshot {
        let request = json!([{ "command": "update", "arg1": 0, "arg2": 0 }]);
        let response = match self.http.post(&self.config.status_url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Telemetry request failed: {}", e);
                self.connected.store(false, Ordering::SeqCst);
                return TelemetrySnapshot::default();
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!("Telemetry request returned {}", response.status());
            self.connected.store(false, Ordering::SeqCst);
            return TelemetrySnapshot::default();
        }

        self.connected.store(true, Ordering::SeqCst);
        match response.bytes().await {
            Ok(body) => normalize_bytes(&body),
            Err(e) => {
                debug!("Failed to read telemetry body: {}", e);
                TelemetrySnapshot::default()
            }
        }
    }

    fn deliver(&self, snapshot: TelemetrySnapshot) {
        if catch_unwind(AssertUnwindSafe(|| (self.callback)(snapshot))).is_err() {
            error!("Snapshot callback panicked");
        }
    }

    /// HELLO until the server answers, then START_TEST until acknowledged
    async fn start_receiver(&self) {
        loop {
            let reply = self.line.hello().await;
            if reply.contains("HELLO") {
                break;
            }
            debug!("Waiting for control server: {}", reply);
            sleep(HANDSHAKE_RETRY).await;
        }

        loop {
            let reply = self.line.start_receiver().await;
            if reply.starts_with("ACK") {
                info!("Receiver started: {}", reply);
                return;
            }
            warn!("Receiver start not acknowledged: {}", reply);
            sleep(HANDSHAKE_RETRY).await;
        }
    }
}

async fn poll_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    if shared.config.start_receiver_on_connect {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = shared.start_receiver() => {}
        }
    }

    let interval = shared.config.poll_interval();
    loop {
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => break,
            snapshot = shared.fetch_latest() => snapshot,
        };
        shared.deliver(snapshot);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }
    }
    debug!("Poll loop exited");
}
