//! Channel error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Invalid payload on {channel}: {message}")]
    InvalidPayload { channel: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel closed")]
    Disconnected,

    #[error("Command failed: {0}")]
    CommandFailed(String),
}
