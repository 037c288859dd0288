//! Error types for Stride Flux

use thiserror::Error;

/// Errors that can occur during computation
///
/// Every variant is recoverable: invalid input is rejected before it can touch
/// an [`ActivityLog`](crate::activity_log::ActivityLog) or any derived state.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid amount: {0} (amounts must be positive and finite)")]
    InvalidAmount(f64),

    #[error("Target requested before campaign start (elapsed day {0}, first day is 1)")]
    PreCampaign(i64),

    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown goal: {0}")]
    UnknownGoal(String),

    #[error("Invalid activity record: {0}")]
    InvalidRecord(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ComputeError {
    /// Stable machine-readable code for reporting
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::InvalidAmount(_) => "INVALID_AMOUNT",
            ComputeError::PreCampaign(_) => "PRE_CAMPAIGN",
            ComputeError::ParseError(_) | ComputeError::JsonError(_) => "PARSE_ERROR",
            ComputeError::ConfigError(_) => "CONFIG_ERROR",
            ComputeError::UnknownGoal(_) => "UNKNOWN_GOAL",
            ComputeError::InvalidRecord(_) => "INVALID_RECORD",
            ComputeError::DateOutOfRange(_) => "DATE_OUT_OF_RANGE",
            ComputeError::EncodingError(_) => "ENCODING_ERROR",
        }
    }
}
