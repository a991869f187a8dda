//! Error types for the Telwarden core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("invalid telemetry: {0}")]
    InvalidTelemetry(String),

    #[error("revoke endpoint returned {status} for device {device_id}")]
    RevokeRejected { device_id: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WardenError>;
