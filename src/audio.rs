//! # Host Audio
//!
//! Volume control for the receiver's audio output.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::AudioConfig;
use crate::error::{ControlError, Result};

/// Direction of a volume change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDirection {
    Up,
    Down,
}

/// Host mixer control
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VolumeControl: Send + Sync {
    /// Change the volume by `step` percent
    async fn adjust(&self, direction: VolumeDirection, step: u8) -> Result<()>;
}

/// ALSA mixer driven through `amixer`
#[derive(Debug, Clone)]
pub struct AmixerVolume {
    control: String,
}

impl AmixerVolume {
    pub fn new(config: &AudioConfig) -> Self {
        Self { control: config.mixer_control.clone() }
    }
}

#[async_trait]
impl VolumeControl for AmixerVolume {
    async fn adjust(&self, direction: VolumeDirection, step: u8) -> Result<()> {
        let change = amixer_change(direction, step);
        debug!("amixer -q sset {} {}", self.control, change);

        let output = Command::new("amixer")
            .args(["-q", "sset", &self.control, &change])
            .output()
            .await?;

        if !output.status.success() {
            return Err(ControlError::Session(format!(
                "amixer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

fn amixer_change(direction: VolumeDirection, step: u8) -> String {
    match direction {
        VolumeDirection::Up => format!("{}%+", step),
        VolumeDirection::Down => format!("{}%-", step),
    }
}
