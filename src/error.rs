//! # Error Types
//!
//! Custom error types for OP25 Control using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for OP25 Control
#[derive(Debug, Error)]
pub enum ControlError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction or transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The trunk configuration file does not exist
    #[error("Trunk config file not found: {}", .0.display())]
    TrunkConfigNotFound(PathBuf),

    /// The trunk configuration file has a header but no data row
    #[error("No data found in {}", .0.display())]
    EmptyTrunkConfig(PathBuf),

    /// Malformed tab-separated content
    #[error("Malformed TSV: {0}")]
    Tsv(String),

    /// Line-command or settings string that could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Receiver session control failures
    #[error("Session error: {0}")]
    Session(String),

    /// Site catalog lookups
    #[error("Site {site} not found for system {system}")]
    SiteNotFound { system: String, site: String },
}

/// Result type alias for OP25 Control
pub type Result<T> = std::result::Result<T, ControlError>;
