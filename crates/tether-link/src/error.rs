//! Transport error type.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the transport adapter and the event-loop pumps.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed by remote")]
    Closed,

    #[error("frame encoding: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("dial timed out after {0:?}")]
    DialTimeout(Duration),
}
