//! # Telemetry Module
//!
//! Normalizes the receiver's HTTP status responses into typed snapshots.
//!
//! This module handles:
//! - Typed views of the `change_freq`, `trunk_update` and `rx_update` records
//! - Mapping a heterogeneous JSON array into a [`TelemetrySnapshot`]
//! - Derived values the front end needs (signal level, active talkgroups)

pub mod types;
pub mod normalizer;

pub use normalizer::{normalize, normalize_bytes};
pub use types::{ChangeFreq, FrequencyData, RxUpdate, SignalLevel, TelemetrySnapshot, TrunkUpdate};
