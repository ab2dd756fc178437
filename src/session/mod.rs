//! # Receiver Session Module
//!
//! Ownership of the single named background session running the receiver.
//!
//! This module handles:
//! - The [`SessionManager`] capability used by the controller
//! - Building the receiver command line from configuration
//! - Mapping front-end SDR names and gain values to receiver arguments
//! - A GNU `screen` backed implementation ([`screen::ScreenSessionManager`])

pub mod screen;

use async_trait::async_trait;

use crate::config::ReceiverConfig;
use crate::error::Result;

pub use screen::ScreenSessionManager;

/// Control over named, detached OS sessions
///
/// Stopping a session that does not exist is not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Launch `argv` detached under `name`
    async fn start(&self, name: &str, argv: &[String]) -> Result<()>;

    /// Terminate the session called `name`, if any
    async fn stop(&self, name: &str) -> Result<()>;

    async fn is_alive(&self, name: &str) -> Result<bool>;

    /// Current screen contents of the session
    async fn capture_output(&self, name: &str) -> Result<String>;
}

/// Device and gain selection for one receiver launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverLaunch {
    pub device_args: String,
    pub gain: String,
}

impl ReceiverLaunch {
    /// The configured default device
    pub fn from_config(config: &ReceiverConfig) -> Self {
        Self {
            device_args: config.device_args.clone(),
            gain: config.gain.clone(),
        }
    }

    /// Launch for an SDR picked by name in the front end
    pub fn manual(sdr: &str, gain: &str) -> Self {
        Self {
            device_args: sdr_device_args(sdr),
            gain: gain_setting(gain),
        }
    }

    /// Full receiver command line
    pub fn argv(&self, config: &ReceiverConfig) -> Vec<String> {
        vec![
            config.program.clone(),
            "--args".to_string(),
            self.device_args.clone(),
            "-N".to_string(),
            self.gain.clone(),
            "-S".to_string(),
            config.sample_rate.to_string(),
            "-x".to_string(),
            "2".to_string(),
            "-T".to_string(),
            config.trunk_config.display().to_string(),
            "-U".to_string(),
            "-X".to_string(),
            "-l".to_string(),
            format!("http:0.0.0.0:{}", config.status_port),
        ]
    }
}

/// Receiver `--args` value for a front-end SDR name
pub fn sdr_device_args(sdr: &str) -> String {
    match sdr.trim() {
        "RTL-SDR" => "rtl".to_string(),
        "HackRF" => "hackrf".to_string(),
        "SDRplay" => "soapy=0,driver=sdrplay".to_string(),
        other => other.to_lowercase(),
    }
}

/// Receiver `-N` value; a bare number applies to the LNA stage
pub fn gain_setting(gain: &str) -> String {
    let gain = gain.trim();
    if gain.contains(':') {
        gain.to_string()
    } else {
        format!("LNA:{}", gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_argv() {
        let config = ReceiverConfig::default();
        let argv = ReceiverLaunch::from_config(&config).argv(&config);
        assert_eq!(
            argv,
            vec![
                "./rx.py", "--args", "rtl", "-N", "LNA:47", "-S", "2500000", "-x", "2", "-T",
                "trunk.tsv", "-U", "-X", "-l", "http:0.0.0.0:8080",
            ]
        );
    }

    #[test]
    fn test_manual_launch_mapping() {
        let launch = ReceiverLaunch::manual("SDRplay", "40");
        assert_eq!(launch.device_args, "soapy=0,driver=sdrplay");
        assert_eq!(launch.gain, "LNA:40");

        assert_eq!(sdr_device_args("RTL-SDR"), "rtl");
        assert_eq!(sdr_device_args("HackRF"), "hackrf");
        assert_eq!(sdr_device_args("Airspy"), "airspy");
    }

    #[test]
    fn test_gain_with_stage_passes_through() {
        assert_eq!(gain_setting("IF:20"), "IF:20");
        assert_eq!(gain_setting(" 30 "), "LNA:30");
    }
}
