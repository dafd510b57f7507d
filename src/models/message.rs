//! Socket message history entry.

use serde::{Deserialize, Serialize};

/// One recorded socket exchange.
///
/// Owned by the gateway process only: entries live in a bounded in-memory
/// sequence (newest first, capped at 50) and are lost on restart. The
/// snake_case JSON keys match what the browser console reads
/// (`msg.client_info` etc.).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageRecord {
    /// Monotonic, time-derived id (epoch milliseconds).
    pub id: i64,

    /// Message as sent to the socket server.
    pub message: String,

    /// First response chunk received back.
    pub response: String,

    /// ISO-8601 timestamp of the exchange.
    pub timestamp: String,

    /// Address of the HTTP caller that triggered the send.
    pub client_info: String,
}
