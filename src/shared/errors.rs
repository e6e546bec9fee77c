//! Error handling for the application

use thiserror::Error;

/// Fetch-related errors, one per upstream call outcome
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{call} request failed with status: {status}")]
    ApiStatus { call: String, status: u16 },

    #[error("{call} request failed: {reason}")]
    Transport { call: String, reason: String },

    #[error("{call} returned malformed data: {reason}")]
    MalformedResponse { call: String, reason: String },

    #[error("{0}")]
    NoData(String),
}

impl FetchError {
    pub fn no_data(msg: impl Into<String>) -> Self {
        FetchError::NoData(msg.into())
    }

    pub fn malformed(call: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::MalformedResponse {
            call: call.into(),
            reason: reason.into(),
        }
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
