//! # Line Commands
//!
//! Newline-free ASCII commands accepted by the line-socket control surface.
//! Arguments are separated by `;`.

use std::fmt;
use std::str::FromStr;

use super::settings::TrunkSettings;
use crate::error::{ControlError, Result};

/// Scan strategy for a system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Follow every talkgroup on the system
    System,
    /// Follow only the whitelisted scan-grid talkgroups
    Grid,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::System => "system",
            ScanMode::Grid => "grid",
        }
    }
}

impl FromStr for ScanMode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(ScanMode::System),
            "grid" => Ok(ScanMode::Grid),
            other => Err(ControlError::Protocol(format!("unknown scan mode: {}", other))),
        }
    }
}

/// One `tgid:label` element of a whitelist command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub tgid: u32,
    pub label: String,
}

impl FromStr for WhitelistEntry {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        let (tgid, label) = s.split_once(':').unwrap_or((s, ""));
        let tgid = tgid
            .trim()
            .parse()
            .map_err(|_| ControlError::Protocol(format!("invalid talkgroup id: {:?}", tgid)))?;
        Ok(Self { tgid, label: label.to_string() })
    }
}

impl fmt::Display for WhitelistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tgid, self.label)
    }
}

/// A decoded line command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    Hello,
    StartTest,
    StopOp25,
    ReadTrunk,
    WriteTrunk(TrunkSettings),
    ManualStart { sdr: String, gain: String },
    IncreaseVolume,
    DecreaseVolume,
    WriteWhitelist { system: String, entries: Vec<WhitelistEntry> },
    WriteScanMode { system: String, mode: ScanMode },
    SiteLock { system: String, site: String },
    CreateSystem { username: String, password: String, system: String },
    StartSystem { site: String, system: String },
}

impl LineCommand {
    /// Command keyword, for logging without arguments (some carry credentials)
    pub fn name(&self) -> &'static str {
        match self {
            LineCommand::Hello => "HELLO",
            LineCommand::StartTest => "START_TEST",
            LineCommand::StopOp25 => "STOP_OP25",
            LineCommand::ReadTrunk => "READ_TRUNK",
            LineCommand::WriteTrunk(_) => "WRITE_TRUNK",
            LineCommand::ManualStart { .. } => "MANUAL_START",
            LineCommand::IncreaseVolume => "INCREASE_VOLUME",
            LineCommand::DecreaseVolume => "DECREASE_VOLUME",
            LineCommand::WriteWhitelist { .. } => "WRITE_WHITELIST",
            LineCommand::WriteScanMode { .. } => "WRITE_SCANMODE",
            LineCommand::SiteLock { .. } => "SITELOCK",
            LineCommand::CreateSystem { .. } => "CREATE_SYSTEM",
            LineCommand::StartSystem { .. } => "START_SYSTEM",
        }
    }
}

impl FromStr for LineCommand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        let line = s.trim_end_matches(&['\r', '\n', '\0'][..]);
        let (keyword, rest) = line.split_once(';').unwrap_or((line, ""));
        let args: Vec<&str> = if rest.is_empty() { Vec::new() } else { rest.split(';').collect() };

        let command = match (keyword, args.as_slice()) {
            ("HELLO", []) => LineCommand::Hello,
            ("START_TEST", []) => LineCommand::StartTest,
            ("STOP_OP25", []) => LineCommand::StopOp25,
            ("READ_TRUNK", []) => LineCommand::ReadTrunk,
            ("INCREASE_VOLUME", []) => LineCommand::IncreaseVolume,
            ("DECREASE_VOLUME", []) => LineCommand::DecreaseVolume,
            ("WRITE_TRUNK", _) => LineCommand::WriteTrunk(rest.parse()?),
            ("MANUAL_START", [sdr, gain]) => LineCommand::ManualStart {
                sdr: sdr.to_string(),
                gain: gain.to_string(),
            },
            ("WRITE_WHITELIST", [system, entries @ ..]) => LineCommand::WriteWhitelist {
                system: system.to_string(),
                entries: entries
                    .iter()
                    .filter(|entry| !entry.is_empty())
                    .map(|entry| entry.parse())
                    .collect::<Result<Vec<_>>>()?,
            },
            ("WRITE_SCANMODE", [system, mode]) => LineCommand::WriteScanMode {
                system: keyed(system, "system")?.to_string(),
                mode: keyed(mode, "mode")?.parse()?,
            },
            ("SITELOCK", [system, site]) => LineCommand::SiteLock {
                system: system.to_string(),
                site: site.to_string(),
            },
            ("CREATE_SYSTEM", [username, password, system]) => LineCommand::CreateSystem {
                username: username.to_string(),
                password: password.to_string(),
                system: system.to_string(),
            },
            ("START_SYSTEM", [site, system]) => LineCommand::StartSystem {
                site: site.to_string(),
                system: system.to_string(),
            },
            _ => return Err(ControlError::Protocol(format!("unknown command: {:?}", keyword))),
        };

        Ok(command)
    }
}

impl fmt::Display for LineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineCommand::WriteTrunk(settings) => write!(f, "WRITE_TRUNK;{}", settings),
            LineCommand::ManualStart { sdr, gain } => write!(f, "MANUAL_START;{};{}", sdr, gain),
            LineCommand::WriteWhitelist { system, entries } => {
                write!(f, "WRITE_WHITELIST;{};", system)?;
                let joined: Vec<String> = entries.iter().map(ToString::to_string).collect();
                f.write_str(&joined.join(";"))
            }
            LineCommand::WriteScanMode { system, mode } => {
                write!(f, "WRITE_SCANMODE;system={};mode={}", system, mode.as_str())
            }
            LineCommand::SiteLock { system, site } => write!(f, "SITELOCK;{};{}", system, site),
            LineCommand::CreateSystem { username, password, system } => {
                write!(f, "CREATE_SYSTEM;{};{};{}", username, password, system)
            }
            LineCommand::StartSystem { site, system } => {
                write!(f, "START_SYSTEM;{};{}", site, system)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Value of a `key=value` argument, requiring the expected key
fn keyed<'a>(arg: &'a str, key: &str) -> Result<&'a str> {
    match arg.split_once('=') {
        Some((k, v)) if k == key => Ok(v),
        _ => Err(ControlError::Protocol(format!("expected {}=<value>, got {:?}", key, arg))),
    }
}
