//! Identity error type.

use thiserror::Error;

/// Errors raised while acquiring or persisting the robot identity.
#[derive(Debug, Error)]
pub enum IdentError {
    #[error("identity storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("identity record encoding: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("identity request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("no network interface with a hardware address")]
    NoMacAddress,

    #[error("could not resolve the current username")]
    NoUsername,
}
