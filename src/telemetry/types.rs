//! # Telemetry Types
//!
//! Typed views of the records returned by the receiver's `update` command.
//!
//! Every field is optional: a key the receiver did not send is `None`, never a
//! zero or empty default. A value of the wrong JSON type is also `None`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Decode counts at which the signal is reported as fair / good / strong
pub const TSBKS_FAIR: i64 = 400;
pub const TSBKS_GOOD: i64 = 2000;
pub const TSBKS_STRONG: i64 = 10000;

/// Voice channel tuning reported when the receiver follows a call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeFreq {
    #[serde(default, deserialize_with = "lenient")]
    pub freq: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tgid: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub nac: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub system: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub center_frequency: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tdma: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub wacn: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sysid: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tuner: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sigtype: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fine_tune: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub stream_url: Option<String>,
}

/// Per-frequency activity inside a trunk update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyData {
    /// Talkgroups heard on this frequency; TDMA slots may be `null`
    #[serde(default)]
    pub tgids: Vec<Option<i64>>,

    /// Remaining receiver-specific keys, relayed untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Control channel state for the system the receiver is locked to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrunkUpdate {
    #[serde(default, deserialize_with = "lenient")]
    pub top_line: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub syid: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rfid: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub stid: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sysid: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rxchan: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub txchan: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub wacn: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub secondary: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub frequencies: Option<BTreeMap<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub frequency_data: Option<BTreeMap<String, FrequencyData>>,
    /// Receiver timestamp of the last control-channel message
    #[serde(default, deserialize_with = "lenient")]
    pub last_tsbk: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tsbks: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub adjacent_data: Option<BTreeMap<String, Value>>,
}

/// Demodulator status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RxUpdate {
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub fine_tune: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub files: Option<Vec<String>>,
}

/// One normalized poll response
///
/// A section is `Some` only if the receiver reported it in that response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_freq: Option<ChangeFreq>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trunk_update: Option<TrunkUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_update: Option<RxUpdate>,
}

/// Coarse signal quality derived from the control-channel decode count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    NoSignal,
    Fair,
    Good,
    Strong,
}

impl SignalLevel {
    /// Classify a decode count; `None` means the receiver did not report one
    pub fn from_tsbks(tsbks: Option<i64>) -> Self {
        match tsbks {
            Some(n) if n >= TSBKS_STRONG => SignalLevel::Strong,
            Some(n) if n >= TSBKS_GOOD => SignalLevel::Good,
            Some(n) if n >= TSBKS_FAIR => SignalLevel::Fair,
            _ => SignalLevel::NoSignal,
        }
    }
}

impl TelemetrySnapshot {
    /// True when no section was reported
    pub fn is_empty(&self) -> bool {
        self.change_freq.is_none() && self.trunk_update.is_none() && self.rx_update.is_none()
    }

    pub fn signal_level(&self) -> SignalLevel {
        SignalLevel::from_tsbks(self.trunk_update.as_ref().and_then(|t| t.tsbks))
    }

    /// Talkgroups currently active on any voice frequency, in frequency order
    pub fn active_talkgroups(&self) -> Vec<i64> {
        self.trunk_update
            .as_ref()
            .and_then(|t| t.frequency_data.as_ref())
            .map(|data| {
                data.values()
                    .flat_map(|f| f.tgids.iter().flatten().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The followed talkgroup, if it is still active on a voice frequency
    pub fn current_talkgroup(&self) -> Option<i64> {
        let tgid = self.change_freq.as_ref()?.tgid?;
        self.active_talkgroups().contains(&tgid).then_some(tgid)
    }
}

/// Deserialize a field, mapping values of the wrong shape to `None`
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}
