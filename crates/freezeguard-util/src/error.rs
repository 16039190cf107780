//! Error types for freezeguard

use thiserror::Error;

/// Core error type for freezeguard operations
#[derive(Debug, Error)]
pub enum FreezeError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Event payload error: {0}")]
    Payload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FreezeError {
    pub fn timestamp(value: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            message: msg.into(),
        }
    }

    pub fn rule(msg: impl Into<String>) -> Self {
        Self::InvalidRule(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FreezeError>;
