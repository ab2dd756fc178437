//! # Session Controller
//!
//! Request handlers shared by the HTTP and line-socket front ends. Every
//! handler returns a [`Reply`]; failures become `NACK` replies and never
//! escape to the transport.

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use crate::audio::{VolumeControl, VolumeDirection};
use crate::config::{Config, ReceiverConfig};
use crate::error::{ControlError, Result};
use crate::protocol::{ConfigUpdate, LineCommand, Reply, ScanMode, TrunkSettings, WhitelistEntry};
use crate::session::{ReceiverLaunch, SessionManager};
use crate::trunk::{validate_system_id, SiteCatalog, TrunkConfigRecord, CONTROL_CHANNEL_LIST, WHITELIST};

/// How often a stopping session is checked for exit
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Site held by `SITELOCK` until the receiver is stopped
#[derive(Debug, Clone, PartialEq, Eq)]
struct SiteLock {
    system: String,
    site: String,
}

#[derive(Debug, Default)]
struct ControllerState {
    site_lock: Option<SiteLock>,
}

/// Owner of the receiver session and its trunk config
///
/// Session start/stop and trunk config read-modify-write hold one async lock,
/// so concurrent requests never run two sessions or interleave file writes.
pub struct SessionController {
    sessions: Arc<dyn SessionManager>,
    volume: Arc<dyn VolumeControl>,
    receiver: ReceiverConfig,
    volume_step: u8,
    state: Mutex<ControllerState>,
}

impl SessionController {
    pub fn new(config: &Config, sessions: Arc<dyn SessionManager>, volume: Arc<dyn VolumeControl>) -> Self {
        Self {
            sessions,
            volume,
            receiver: config.receiver.clone(),
            volume_step: config.audio.volume_step,
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn hello(&self) -> Reply {
        Reply::ack("HELLO")
    }

    /// Restart the receiver with the configured device
    pub async fn start_test(&self) -> Reply {
        let _state = self.state.lock().await;
        let launch = ReceiverLaunch::from_config(&self.receiver);
        self.started(self.restart(&launch).await)
    }

    pub async fn stop_op25(&self) -> Reply {
        let mut state = self.state.lock().await;
        match self.sessions.stop(&self.receiver.session_name).await {
            Ok(()) => {
                if let Some(lock) = state.site_lock.take() {
                    info!("Released site lock on {} / {}", lock.system, lock.site);
                }
                Reply::ack("OP25 stopped")
            }
            Err(e) => {
                warn!("Failed to stop receiver: {}", e);
                Reply::nack(format!("Error stopping OP25 - {}", e))
            }
        }
    }

    pub async fn get_output(&self) -> Reply {
        match self.sessions.capture_output(&self.receiver.session_name).await {
            Ok(text) => Reply::Text(text),
            Err(e) => Reply::nack(format!("Error getting output - {}", e)),
        }
    }

    pub async fn get_config(&self) -> Reply {
        let _state = self.state.lock().await;
        match self.read_settings().await {
            Ok(settings) => Reply::Text(format!(
                "Control Channel List: {} Sysname: {} Talkgroup List Name: {}",
                settings.cclist, settings.sysname, settings.tglist
            )),
            Err(e) => self.trunk_failure(e, "Error reading config"),
        }
    }

    /// Partial trunk config update from a JSON request body
    pub async fn write_config(&self, body: &[u8]) -> Reply {
        let Some(update) = parse_config_update(body) else {
            return Reply::nack("No JSON data received");
        };

        let _state = self.state.lock().await;
        match self.update_trunk(update.column_updates()).await {
            Ok(()) => Reply::ack("Config updated"),
            Err(e) => self.trunk_failure(e, "Error updating config"),
        }
    }

    /// Decode and run one line command
    pub async fn handle_line(&self, line: &str) -> Reply {
        match line.parse::<LineCommand>() {
            Ok(command) => {
                debug!("Line command {}", command.name());
                self.dispatch(command).await
            }
            Err(e) => {
                warn!("Rejected line command: {}", e);
                Reply::nack("Unknown command")
            }
        }
    }

    pub async fn dispatch(&self, command: LineCommand) -> Reply {
        match command {
            LineCommand::Hello => self.hello(),
            LineCommand::StartTest => self.start_test().await,
            LineCommand::StopOp25 => self.stop_op25().await,
            LineCommand::ReadTrunk => self.read_trunk().await,
            LineCommand::WriteTrunk(settings) => self.write_trunk(&settings).await,
            LineCommand::ManualStart { sdr, gain } => self.manual_start(&sdr, &gain).await,
            LineCommand::IncreaseVolume => self.adjust_volume(VolumeDirection::Up).await,
            LineCommand::DecreaseVolume => self.adjust_volume(VolumeDirection::Down).await,
            LineCommand::WriteWhitelist { system, entries } => {
                self.write_whitelist(&system, &entries).await
            }
            LineCommand::WriteScanMode { system, mode } => self.write_scan_mode(&system, mode).await,
            LineCommand::SiteLock { system, site } => self.site_lock(&system, &site).await,
            LineCommand::StartSystem { site, system } => self.start_system(&site, &system).await,
            LineCommand::CreateSystem { system, .. } => self.create_system(&system),
        }
    }

    pub async fn read_trunk(&self) -> Reply {
        let _state = self.state.lock().await;
        match self.read_settings().await {
            Ok(settings) => Reply::Text(settings.to_string()),
            Err(e) => self.trunk_failure(e, "Error reading config"),
        }
    }

    pub async fn write_trunk(&self, settings: &TrunkSettings) -> Reply {
        let _state = self.state.lock().await;
        match self.update_trunk(settings.column_updates()).await {
            Ok(()) => Reply::ack("Trunk updated"),
            Err(e) => self.trunk_failure(e, "Error updating config"),
        }
    }

    /// Restart the receiver on a device picked in the front end
    pub async fn manual_start(&self, sdr: &str, gain: &str) -> Reply {
        let _state = self.state.lock().await;
        let launch = ReceiverLaunch::manual(sdr, gain);
        info!("Manual start with {} / {}", launch.device_args, launch.gain);
        self.started(self.restart(&launch).await)
    }

    pub async fn adjust_volume(&self, direction: VolumeDirection) -> Reply {
        match self.volume.adjust(direction, self.volume_step).await {
            Ok(()) => match direction {
                VolumeDirection::Up => Reply::ack("Volume increased"),
                VolumeDirection::Down => Reply::ack("Volume decreased"),
            },
            Err(e) => Reply::nack(format!("Error adjusting volume - {}", e)),
        }
    }

    /// Replace the talkgroup whitelist of `system`, one tgid per line
    pub async fn write_whitelist(&self, system: &str, entries: &[WhitelistEntry]) -> Reply {
        let result = async {
            validate_system_id(system)?;
            let dir = self.receiver.systems_path();
            tokio::fs::create_dir_all(&dir).await?;

            let contents: String = entries.iter().map(|entry| format!("{}\n", entry.tgid)).collect();
            tokio::fs::write(SiteCatalog::whitelist_path(&dir, system), contents).await?;
            Ok::<_, ControlError>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!("Wrote {} whitelisted talkgroups for system {}", entries.len(), system);
                Reply::ack("Whitelist updated")
            }
            Err(e) => Reply::nack(format!("Error writing whitelist - {}", e)),
        }
    }

    /// Point the trunk config at the system whitelist (`grid`) or clear it
    pub async fn write_scan_mode(&self, system: &str, mode: ScanMode) -> Reply {
        let whitelist = match mode {
            ScanMode::Grid => {
                if let Err(e) = validate_system_id(system) {
                    return Reply::nack(format!("Error setting scan mode - {}", e));
                }
                self.receiver_relative_whitelist(system).display().to_string()
            }
            ScanMode::System => String::new(),
        };

        let _state = self.state.lock().await;
        match self.update_trunk([(WHITELIST, whitelist)]).await {
            Ok(()) => Reply::ack(format!("Scan mode set to {}", mode.as_str())),
            Err(e) => Reply::nack(format!("Error setting scan mode - {}", e)),
        }
    }

    /// Switch to `site` and hold it until the receiver is stopped
    pub async fn site_lock(&self, system: &str, site: &str) -> Reply {
        let mut state = self.state.lock().await;
        match self.switch_site(system, site).await {
            Ok(()) => {
                state.site_lock = Some(SiteLock {
                    system: system.to_string(),
                    site: site.to_string(),
                });
                info!("Locked to site {} on system {}", site, system);
                Reply::ack(format!("Site locked to {}", site))
            }
            Err(e) => Reply::nack(format!("Error switching site - {}", e)),
        }
    }

    /// Switch to `site` unless a site lock is held
    pub async fn start_system(&self, site: &str, system: &str) -> Reply {
        let state = self.state.lock().await;
        if let Some(lock) = &state.site_lock {
            debug!("Ignoring START_SYSTEM {} / {} while locked", system, site);
            return Reply::nack(format!("Site locked to {} on system {}", lock.site, lock.system));
        }

        match self.switch_site(system, site).await {
            Ok(()) => Reply::ack("System started"),
            Err(e) => Reply::nack(format!("Error switching site - {}", e)),
        }
    }

    pub fn create_system(&self, system: &str) -> Reply {
        warn!("Refusing to import system {}", system);
        Reply::nack("System import is not supported")
    }

    fn started(&self, result: Result<()>) -> Reply {
        match result {
            Ok(()) => Reply::ack("OP25 started"),
            Err(e) => {
                warn!("Failed to start receiver: {}", e);
                Reply::nack(format!("Error starting OP25 - {}", e))
            }
        }
    }

    /// An empty trunk file is reported by its configured name, not its full path
    fn trunk_failure(&self, error: ControlError, context: &str) -> Reply {
        match error {
            ControlError::EmptyTrunkConfig(_) => Reply::nack(format!(
                "No data found in {}",
                self.receiver.trunk_config.display()
            )),
            e => Reply::nack(format!("{} - {}", context, e)),
        }
    }

    /// Kill any running session, wait for it to exit, then launch
    ///
    /// Callers hold the state lock.
    async fn restart(&self, launch: &ReceiverLaunch) -> Result<()> {
        let name = &self.receiver.session_name;
        self.sessions.stop(name).await?;
        self.wait_until_stopped(name).await?;

        let argv = launch.argv(&self.receiver);
        self.sessions.start(name, &argv).await?;
        info!("Receiver session {} started", name);
        Ok(())
    }

    async fn wait_until_stopped(&self, name: &str) -> Result<()> {
        let deadline = Instant::now() + self.receiver.stop_timeout();
        while self.sessions.is_alive(name).await? {
            if Instant::now() >= deadline {
                return Err(ControlError::Session(format!("session {} did not stop", name)));
            }
            sleep(STOP_POLL_INTERVAL).await;
        }
        Ok(())
    }

    /// Load the control channels of `site`, write them and restart
    ///
    /// Callers hold the state lock.
    async fn switch_site(&self, system: &str, site: &str) -> Result<()> {
        let catalog = SiteCatalog::load(&self.receiver.systems_path(), system).await?;
        let channels = catalog.control_channels(site).ok_or_else(|| ControlError::SiteNotFound {
            system: system.to_string(),
            site: site.to_string(),
        })?;

        self.update_trunk([(CONTROL_CHANNEL_LIST, channels.to_string())]).await?;
        self.restart(&ReceiverLaunch::from_config(&self.receiver)).await
    }

    async fn read_settings(&self) -> Result<TrunkSettings> {
        let record = TrunkConfigRecord::read(self.receiver.trunk_config_path()).await?;
        Ok(record.settings())
    }

    async fn update_trunk<I>(&self, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'static str, String)>,
    {
        let path = self.receiver.trunk_config_path();
        let mut record = TrunkConfigRecord::read(&path).await?;
        let applied = record.update(updates);
        record.write(&path).await?;
        info!("Updated {} trunk config column(s)", applied);
        Ok(())
    }

    /// Whitelist path as the receiver sees it from its working directory
    fn receiver_relative_whitelist(&self, system: &str) -> PathBuf {
        SiteCatalog::whitelist_path(&self.receiver.systems_dir, system)
    }
}

/// A non-empty JSON object, or nothing
fn parse_config_update(body: &[u8]) -> Option<ConfigUpdate> {
    let map: serde_json::Map<String, Value> = serde_json::from_slice(body).ok()?;
    if map.is_empty() {
        return None;
    }
    serde_json::from_value(Value::Object(map)).ok()
}
