//! GNU `screen` implementation of [`SessionManager`]

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

use super::SessionManager;
use crate::config::ReceiverConfig;
use crate::error::{ControlError, Result};

/// Runs the receiver inside a detached `screen` session
#[derive(Debug, Clone)]
pub struct ScreenSessionManager {
    /// `screen` executable
    program: String,
    /// Directory sessions are launched from
    working_dir: PathBuf,
    /// Hardcopy target for output capture
    capture_path: PathBuf,
}

impl ScreenSessionManager {
    pub fn new(config: &ReceiverConfig) -> Self {
        Self {
            program: "screen".to_string(),
            working_dir: config.working_dir.clone(),
            capture_path: config.capture_path.clone(),
        }
    }

    /// Use a different `screen` executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn screen(&self, args: &[&str]) -> Result<Output> {
        debug!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .await?;
        Ok(output)
    }
}

#[async_trait]
impl SessionManager for ScreenSessionManager {
    async fn start(&self, name: &str, argv: &[String]) -> Result<()> {
        let mut args = vec!["-dmS", name];
        args.extend(argv.iter().map(String::as_str));

        let output = self.screen(&args).await?;
        if !output.status.success() {
            return Err(ControlError::Session(format!(
                "screen exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!("Started session {} in {}", name, self.working_dir.display());
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        // Non-zero exit means there was no such session
        let output = self.screen(&["-S", name, "-X", "quit"]).await?;
        if output.status.success() {
            info!("Stopped session {}", name);
        } else {
            debug!("No session {} to stop", name);
        }
        Ok(())
    }

    async fn is_alive(&self, name: &str) -> Result<bool> {
        // `screen -ls` exits non-zero when nothing is running
        let output = self.screen(&["-ls"]).await?;
        Ok(session_listed(&String::from_utf8_lossy(&output.stdout), name))
    }

    async fn capture_output(&self, name: &str) -> Result<String> {
        let capture = self.capture_path.display().to_string();
        let output = self.screen(&["-S", name, "-X", "hardcopy", "-h", &capture]).await?;
        if !output.status.success() {
            return Err(ControlError::Session(format!("no session {} to capture", name)));
        }

        let bytes = tokio::fs::read(&self.capture_path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Whether `screen -ls` output lists a session called `name`
///
/// Sessions are listed as `<pid>.<name>` followed by their state.
pub fn session_listed(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|id| id.split_once('.'))
        .any(|(pid, session)| session == name && pid.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "There are screens on:\n\
\t41210.OP25_SESSION\t(10/18/2026 09:12:44 AM)\t(Detached)\n\
\t40002.pts-0.host\t(Attached)\n\
2 Sockets in /run/screen/S-pi.\n";

    #[test]
    fn test_session_listed() {
        assert!(session_listed(LISTING, "OP25_SESSION"));
        assert!(session_listed(LISTING, "pts-0.host"));
        assert!(!session_listed(LISTING, "OP25"));
        assert!(!session_listed("No Sockets found in /run/screen/S-pi.\n", "OP25_SESSION"));
    }

    #[test]
    fn test_header_lines_are_not_sessions() {
        assert!(!session_listed("There are screens on:\n", "are"));
    }

    #[tokio::test]
    async fn test_missing_screen_binary_is_io_error() {
        let manager = ScreenSessionManager::new(&ReceiverConfig::default())
            .with_program("/nonexistent/screen");

        assert!(matches!(manager.stop("OP25_SESSION").await, Err(ControlError::Io(_))));
        assert!(manager.is_alive("OP25_SESSION").await.is_err());
    }
}
