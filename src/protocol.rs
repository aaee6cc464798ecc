// src/protocol.rs
use serde_json::{json, Value};

use crate::error::TrackerError;
use crate::models::AccountId;

/// JSON-RPC request id of the subscribe call. One subscription per
/// connection, so the id never increments.
pub const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// Commitment level for the log subscription.
pub const COMMITMENT: &str = "confirmed";

/// One parsed inbound frame from the log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Acknowledgment of our subscribe request, carrying the
    /// server-assigned subscription id. Recorded, never forwarded.
    Ack { subscription: u64 },
    /// A log notification for one transaction signature.
    Notification { signature: String },
    /// Valid JSON in a shape we do not handle; logged and dropped upstream.
    Unrecognized,
}

/// Build the `logsSubscribe` request for the tracked account.
pub fn subscribe_request(account: &AccountId) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIBE_REQUEST_ID,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [account.as_str()] },
            { "commitment": COMMITMENT }
        ]
    })
    .to_string()
}

/// Classify one inbound text frame.
///
/// A message without a `params` field is the subscription acknowledgment;
/// everything we act on arrives as a notification with the transaction
/// signature at `params.result.value.signature`.
pub fn parse_inbound(text: &str) -> Result<Inbound, TrackerError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| TrackerError::Protocol(format!("invalid JSON frame: {e}")))?;

    if value.get("params").is_none() {
        return Ok(match value.get("result").and_then(Value::as_u64) {
            Some(subscription) => Inbound::Ack { subscription },
            None => Inbound::Unrecognized,
        });
    }

    match value
        .pointer("/params/result/value/signature")
        .and_then(Value::as_str)
    {
        Some(signature) => Ok(Inbound::Notification {
            signature: signature.to_string(),
        }),
        None => Ok(Inbound::Unrecognized),
    }
}
