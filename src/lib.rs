//! # OP25 Control Library
//!
//! Remote control and live monitoring of an OP25 P25 trunking receiver.
//!
//! This library provides the polling client that normalizes the receiver's
//! telemetry, and the local control server that owns the receiver process
//! and its trunk configuration.

pub mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod trunk;
