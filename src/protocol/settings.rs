//! # Trunk Settings Codecs
//!
//! The three user-editable trunk fields travel in two shapes:
//! - line protocol: `sysname=<s>;cclist=<c>;tglist=<t>`
//! - HTTP: `{"Control_Channel_List": .., "Sysname": .., "Talkgroup_List_Name": ..}`
//!
//! Both translate to the on-disk columns `Sysname`, `Control Channel List`
//! and `TGID Tags File`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ControlError, Result};
use crate::trunk::{CONTROL_CHANNEL_LIST, SYSNAME, TGID_TAGS_FILE};

/// System name, control channel list and talkgroup tags file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrunkSettings {
    pub sysname: String,
    pub cclist: String,
    pub tglist: String,
}

impl TrunkSettings {
    /// Column updates for the trunk config record
    pub fn column_updates(&self) -> Vec<(&'static str, String)> {
        vec![
            (SYSNAME, self.sysname.clone()),
            (CONTROL_CHANNEL_LIST, self.cclist.clone()),
            (TGID_TAGS_FILE, self.tglist.clone()),
        ]
    }
}

impl fmt::Display for TrunkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sysname={};cclist={};tglist={}", self.sysname, self.cclist, self.tglist)
    }
}

impl FromStr for TrunkSettings {
    type Err = ControlError;

    /// Parse `sysname=..;cclist=..;tglist=..`
    ///
    /// All three keys are required; other keys are ignored. Values may be
    /// empty but cannot contain `;`.
    fn from_str(s: &str) -> Result<Self> {
        let mut sysname = None;
        let mut cclist = None;
        let mut tglist = None;

        for pair in s.trim_end_matches(&['\r', '\n'][..]).split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key.trim() {
                "sysname" => sysname = Some(value.to_string()),
                "cclist" => cclist = Some(value.to_string()),
                "tglist" => tglist = Some(value.to_string()),
                _ => {}
            }
        }

        match (sysname, cclist, tglist) {
            (Some(sysname), Some(cclist), Some(tglist)) => Ok(Self { sysname, cclist, tglist }),
            _ => Err(ControlError::Protocol(format!("incomplete trunk settings: {:?}", s))),
        }
    }
}

/// Partial update accepted by `POST /write_config`
///
/// Absent keys leave the corresponding column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(rename = "Control_Channel_List", default, skip_serializing_if = "Option::is_none")]
    pub control_channel_list: Option<String>,

    #[serde(rename = "Sysname", default, skip_serializing_if = "Option::is_none")]
    pub sysname: Option<String>,

    #[serde(rename = "Talkgroup_List_Name", default, skip_serializing_if = "Option::is_none")]
    pub talkgroup_list_name: Option<String>,
}

impl ConfigUpdate {
    /// Translate request field names to on-disk column names
    pub fn column_updates(&self) -> Vec<(&'static str, String)> {
        [
            (CONTROL_CHANNEL_LIST, &self.control_channel_list),
            (SYSNAME, &self.sysname),
            (TGID_TAGS_FILE, &self.talkgroup_list_name),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.clone().map(|v| (column, v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trunk_settings() {
        let settings: TrunkSettings =
            "sysname=County P25;cclist=851.0125,852.3375;tglist=county.tsv".parse().unwrap();
        assert_eq!(settings.sysname, "County P25");
        assert_eq!(settings.cclist, "851.0125,852.3375");
        assert_eq!(settings.tglist, "county.tsv");
    }

    #[test]
    fn test_trunk_settings_display_matches_wire_format() {
        let settings = TrunkSettings {
            sysname: "TestSys".into(),
            cclist: "851.0125".into(),
            tglist: String::new(),
        };
        assert_eq!(settings.to_string(), "sysname=TestSys;cclist=851.0125;tglist=");
    }

    #[test]
    fn test_empty_values_allowed() {
        let settings: TrunkSettings = "sysname=;cclist=;tglist=".parse().unwrap();
        assert_eq!(settings, TrunkSettings::default());
    }

    #[test]
    fn test_incomplete_settings_fail_closed() {
        assert!("sysname=A;cclist=851.0125".parse::<TrunkSettings>().is_err());
        assert!("FAIL".parse::<TrunkSettings>().is_err());
        assert!("".parse::<TrunkSettings>().is_err());
    }

    #[test]
    fn test_trailing_newline_ignored() {
        let settings: TrunkSettings = "sysname=A;cclist=B;tglist=C\r\n".parse().unwrap();
        assert_eq!(settings.tglist, "C");
    }

    #[test]
    fn test_config_update_field_names() {
        let update: ConfigUpdate = serde_json::from_str(
            r#"{"Control_Channel_List":"851.0125","Sysname":"TestSys","Talkgroup_List_Name":"tg.tsv"}"#,
        )
        .unwrap();
        assert_eq!(
            update.column_updates(),
            vec![
                ("Control Channel List", "851.0125".to_string()),
                ("Sysname", "TestSys".to_string()),
                ("TGID Tags File", "tg.tsv".to_string()),
            ]
        );
    }

    #[test]
    fn test_config_update_partial() {
        let update: ConfigUpdate = serde_json::from_str(r#"{"Sysname":"Only"}"#).unwrap();
        assert_eq!(update.column_updates(), vec![("Sysname", "Only".to_string())]);

        let empty: ConfigUpdate = serde_json::from_str("{}").unwrap();
        assert!(empty.column_updates().is_empty());
    }
}
