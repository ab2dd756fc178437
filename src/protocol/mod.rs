//! # Control Protocol Module
//!
//! Wire formats shared by the control server and its clients.
//!
//! This module handles:
//! - Line commands (`HELLO`, `WRITE_TRUNK;sysname=...`, ...) over raw TCP
//! - The `sysname=<s>;cclist=<c>;tglist=<t>` trunk settings string
//! - The `{"response": "ACK: ..."}` envelope of the HTTP surface
//!
//! Decoding fails closed: input that does not parse yields an error, never a
//! partially filled value.

pub mod command;
pub mod reply;
pub mod settings;

pub use command::{LineCommand, ScanMode, WhitelistEntry};
pub use reply::{Envelope, Reply, FAIL_REPLY};
pub use settings::{ConfigUpdate, TrunkSettings};
