#![allow(dead_code)]

use thiserror::Error;

/// Application-level error type.
/// Every workflow in the client funnels failures through this enum; nothing
/// here is fatal to the running process — callers surface remote failures to
/// the user and release their locks so the action can be retried manually.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Malformed data: {0}")]
    MalformedData(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Operation '{0}' already in flight")]
    Busy(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
