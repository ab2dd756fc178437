//! # Replies
//!
//! ACK/NACK reply convention and the JSON envelope used over HTTP.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reply produced by a client whenever the control server cannot be reached
pub const FAIL_REPLY: &str = "FAIL";

/// Outcome of one control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success, rendered as `ACK: <message>`
    Ack(String),
    /// Handled failure, rendered as `NACK: <reason>`
    Nack(String),
    /// Plain text such as captured output or settings strings
    Text(String),
}

impl Reply {
    pub fn ack(message: impl Into<String>) -> Self {
        Reply::Ack(message.into())
    }

    pub fn nack(reason: impl Into<String>) -> Self {
        Reply::Nack(reason.into())
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Reply::Ack(_))
    }

    pub fn is_nack(&self) -> bool {
        matches!(self, Reply::Nack(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ack(message) => write!(f, "ACK: {}", message),
            Reply::Nack(reason) => write!(f, "NACK: {}", reason),
            Reply::Text(text) => f.write_str(text),
        }
    }
}

/// `{"response": "..."}` body of every HTTP control response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub response: String,
}

impl From<Reply> for Envelope {
    fn from(reply: Reply) -> Self {
        Envelope { response: reply.to_string() }
    }
}
