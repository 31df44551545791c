//! Error types for device manager and transport operations

use std::path::PathBuf;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("failed to load devices: {0}")]
    LoadDevices(String),

    #[error("transport is not running")]
    TransportNotRunning,

    #[error("command to {serial_number} failed: {reason}")]
    Command {
        serial_number: String,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    ReadPayload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
