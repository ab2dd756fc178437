//! # Telemetry Normalizer
//!
//! Maps the JSON array returned by the receiver's `update` command into a
//! [`TelemetrySnapshot`].

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::types::{ChangeFreq, RxUpdate, TelemetrySnapshot, TrunkUpdate};

/// Discriminant key carried by every record
pub const JSON_TYPE_KEY: &str = "json_type";

pub const JSON_TYPE_CHANGE_FREQ: &str = "change_freq";
pub const JSON_TYPE_TRUNK_UPDATE: &str = "trunk_update";
pub const JSON_TYPE_RX_UPDATE: &str = "rx_update";

/// Normalize a decoded status response
///
/// Records are applied in array order, so a later `change_freq` or
/// `rx_update` replaces an earlier one from the same response. Unknown
/// discriminants are skipped. Anything other than an array yields an empty
/// snapshot.
///
/// A `trunk_update` record nests its data under a key equal to the record's
/// own `nac` value; the section is only populated when that key resolves to a
/// non-empty object.
///
/// # Examples
///
/// ```
/// use op25_control::telemetry::normalize;
/// use serde_json::json;
///
/// let raw = json!([{"json_type": "rx_update", "error": 0, "fine_tune": 1.5, "files": ["a.wav"]}]);
/// let snapshot = normalize(&raw);
/// assert!(snapshot.rx_update.is_some());
/// assert!(snapshot.change_freq.is_none());
/// ```
pub fn normalize(raw: &Value) -> TelemetrySnapshot {
    let mut snapshot = TelemetrySnapshot::default();

    let Some(records) = raw.as_array() else {
        debug!("Status response is not an array, ignoring");
        return snapshot;
    };

    for record in records {
        match record.get(JSON_TYPE_KEY).and_then(Value::as_str) {
            Some(JSON_TYPE_CHANGE_FREQ) => {
                if let Ok(change_freq) = ChangeFreq::deserialize(record) {
                    snapshot.change_freq = Some(change_freq);
                }
            }
            Some(JSON_TYPE_TRUNK_UPDATE) => {
                if let Some(trunk_update) = nested_trunk_update(record) {
                    snapshot.trunk_update = Some(trunk_update);
                } else {
                    trace!("trunk_update without data for its own NAC, skipping");
                }
            }
            Some(JSON_TYPE_RX_UPDATE) => {
                if let Ok(rx_update) = RxUpdate::deserialize(record) {
                    snapshot.rx_update = Some(rx_update);
                }
            }
            other => trace!("Ignoring record with json_type {:?}", other),
        }
    }

    snapshot
}

/// Normalize a raw response body; unparsable bodies yield an empty snapshot
pub fn normalize_bytes(body: &[u8]) -> TelemetrySnapshot {
    match serde_json::from_slice::<Value>(body) {
        Ok(raw) => normalize(&raw),
        Err(e) => {
            debug!("Unparsable status response: {}", e);
            TelemetrySnapshot::default()
        }
    }
}

fn nested_trunk_update(record: &Value) -> Option<TrunkUpdate> {
    let key = match record.get("nac")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };

    let nested = record.get(&key)?;
    match nested.as_object() {
        Some(fields) if !fields.is_empty() => TrunkUpdate::deserialize(nested).ok(),
        _ => None,
    }
}
