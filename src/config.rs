//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! A single [`Config`] is loaded once at startup and handed by reference to
//! the polling client and the session controller.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ControlError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub receiver: ReceiverConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Polling client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the receiver's HTTP status API
    #[serde(default = "default_status_url")]
    pub status_url: String,

    /// Host running the line-command server
    #[serde(default = "default_command_host")]
    pub command_host: String,

    #[serde(default = "default_command_port")]
    pub command_port: u16,

    /// Base URL of the HTTP control surface
    #[serde(default = "default_control_url")]
    pub control_url: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Send HELLO / START_TEST before the first poll
    #[serde(default = "default_start_receiver_on_connect")]
    pub start_receiver_on_connect: bool,
}

/// Control server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_line_port")]
    pub line_port: u16,

    #[serde(default = "default_line_enabled")]
    pub line_enabled: bool,

    /// How long a line connection may stay silent before it is dropped
    #[serde(default = "default_line_read_timeout_ms")]
    pub line_read_timeout_ms: u64,
}

/// Receiver process configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default = "default_session_name")]
    pub session_name: String,

    /// Directory the receiver is launched from
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_device_args")]
    pub device_args: String,

    #[serde(default = "default_gain")]
    pub gain: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Trunk config file, relative to `working_dir` unless absolute
    #[serde(default = "default_trunk_config")]
    pub trunk_config: PathBuf,

    #[serde(default = "default_status_port")]
    pub status_port: u16,

    #[serde(default = "default_capture_path")]
    pub capture_path: PathBuf,

    /// Site catalogs and whitelists, relative to `working_dir` unless absolute
    #[serde(default = "default_systems_dir")]
    pub systems_dir: PathBuf,

    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

/// Host audio configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_mixer_control")]
    pub mixer_control: String,

    /// Volume change per INCREASE/DECREASE command, in percent
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Daily rolling log files are written here when set
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

// Default value functions
fn default_status_url() -> String { "http://192.168.4.1:8080".to_string() }
fn default_command_host() -> String { "192.168.4.1".to_string() }
fn default_command_port() -> u16 { 8082 }
fn default_control_url() -> String { "http://192.168.4.1:8081".to_string() }
fn default_poll_interval_ms() -> u64 { 2000 }
fn default_http_timeout_ms() -> u64 { 1000 }
fn default_command_timeout_ms() -> u64 { 1000 }
fn default_start_receiver_on_connect() -> bool { true }

fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_http_port() -> u16 { 8081 }
fn default_line_port() -> u16 { 8082 }
fn default_line_enabled() -> bool { true }
fn default_line_read_timeout_ms() -> u64 { 5000 }

fn default_session_name() -> String { "OP25_SESSION".to_string() }
fn default_working_dir() -> PathBuf { PathBuf::from(".") }
fn default_program() -> String { "./rx.py".to_string() }
fn default_device_args() -> String { "rtl".to_string() }
fn default_gain() -> String { "LNA:47".to_string() }
fn default_sample_rate() -> u32 { 2_500_000 }
fn default_trunk_config() -> PathBuf { PathBuf::from("trunk.tsv") }
fn default_status_port() -> u16 { 8080 }
fn default_capture_path() -> PathBuf { PathBuf::from("/tmp/screenlog.0") }
fn default_systems_dir() -> PathBuf { PathBuf::from("systems") }
fn default_stop_timeout_ms() -> u64 { 2000 }

fn default_mixer_control() -> String { "Master".to_string() }
fn default_volume_step() -> u8 { 5 }

fn default_log_level() -> String { "info".to_string() }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            status_url: default_status_url(),
            command_host: default_command_host(),
            command_port: default_command_port(),
            control_url: default_control_url(),
            poll_interval_ms: default_poll_interval_ms(),
            http_timeout_ms: default_http_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
            start_receiver_on_connect: default_start_receiver_on_connect(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            line_port: default_line_port(),
            line_enabled: default_line_enabled(),
            line_read_timeout_ms: default_line_read_timeout_ms(),
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            session_name: default_session_name(),
            working_dir: default_working_dir(),
            program: default_program(),
            device_args: default_device_args(),
            gain: default_gain(),
            sample_rate: default_sample_rate(),
            trunk_config: default_trunk_config(),
            status_port: default_status_port(),
            capture_path: default_capture_path(),
            systems_dir: default_systems_dir(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mixer_control: default_mixer_control(),
            volume_step: default_volume_step(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn line_read_timeout(&self) -> Duration {
        Duration::from_millis(self.line_read_timeout_ms)
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl ReceiverConfig {
    /// Trunk config path as seen from the controller's working directory
    pub fn trunk_config_path(&self) -> PathBuf {
        self.working_dir.join(&self.trunk_config)
    }

    pub fn systems_path(&self) -> PathBuf {
        self.working_dir.join(&self.systems_dir)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use op25_control::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("status_url", &self.client.status_url),
            ("control_url", &self.client.control_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(invalid(format!("{} must be an http(s) URL", name)));
            }
        }

        if self.client.command_host.is_empty() {
            return Err(invalid("command_host cannot be empty"));
        }

        if self.client.poll_interval_ms < 10 || self.client.poll_interval_ms > 60000 {
            return Err(invalid("poll_interval_ms must be between 10 and 60000"));
        }

        for (name, value) in [
            ("http_timeout_ms", self.client.http_timeout_ms),
            ("command_timeout_ms", self.client.command_timeout_ms),
            ("stop_timeout_ms", self.receiver.stop_timeout_ms),
            ("line_read_timeout_ms", self.server.line_read_timeout_ms),
        ] {
            if value == 0 || value > 30000 {
                return Err(invalid(format!("{} must be between 1 and 30000", name)));
            }
        }

        if self.server.line_enabled && self.server.line_port == self.server.http_port {
            return Err(invalid("line_port and http_port must differ"));
        }

        if self.receiver.session_name.is_empty()
            || self.receiver.session_name.chars().any(char::is_whitespace)
        {
            return Err(invalid("session_name must be a non-empty word"));
        }

        if self.receiver.program.is_empty() {
            return Err(invalid("receiver program cannot be empty"));
        }

        if self.receiver.sample_rate == 0 {
            return Err(invalid("sample_rate must be greater than 0"));
        }

        if self.audio.volume_step == 0 || self.audio.volume_step > 100 {
            return Err(invalid("volume_step must be between 1 and 100"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> ControlError {
    ControlError::Config(toml::de::Error::custom(msg))
}
