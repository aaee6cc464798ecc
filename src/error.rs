use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised on the streaming and classification path.
///
/// None of these kill the process: transport failures make the connection
/// manager reconnect, everything else is logged and the offending message
/// or event is dropped.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("RPC error: HTTP {0}")]
    HttpStatus(StatusCode),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("malformed swap metadata: {0}")]
    MalformedMetadata(&'static str),

    #[error("invalid account id: {0}")]
    InvalidAccount(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for TrackerError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        TrackerError::Transport(e.to_string())
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        TrackerError::Transport(e.to_string())
    }
}
