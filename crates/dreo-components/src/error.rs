use dreo_client::ClientError;
use dreo_core::Platform;
use thiserror::Error;

/// Errors raised while reading service data or commanding a device
#[derive(Debug, Error)]
pub enum EntityError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{platform} entities do not support service '{service}'")]
    UnsupportedService { platform: Platform, service: String },

    #[error("Invalid value for '{0}' in service data")]
    InvalidData(String),

    #[error("Missing '{0}' in service data")]
    MissingData(String),

    #[error("{key} value {value} is outside {min}..={max}")]
    OutOfRange {
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown mode '{0}'")]
    UnknownMode(String),

    #[error("Device does not support '{0}'")]
    NotSupported(String),
}

pub type EntityResult<T> = Result<T, EntityError>;
