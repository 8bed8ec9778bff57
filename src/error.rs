// src/error.rs

//! Unified error handling for the monitor application.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A catalog page stayed unreachable after all retry attempts
    #[error("Page {page} unreachable after {attempts} attempts")]
    PageUnreachable { page: u32, attempts: u32 },

    /// Probe failure ratio tripped the high-traffic threshold
    #[error("High traffic detected: {failed}/{total} priority probes failed")]
    HighTraffic { failed: usize, total: usize },

    /// A single payload could not be extracted
    #[error("Extraction error for {context}: {message}")]
    Extraction { context: String, message: String },

    /// Consecutive-failure threshold exceeded; the monitor gives up
    #[error("Fatal monitor failure after {failures} consecutive errors")]
    FatalMonitor { failures: u32 },

    /// Notification dispatch failed
    #[error("Notify error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an extraction error with context.
    pub fn extraction(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extraction {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a notification error.
    pub fn notify(message: impl Into<String>) -> Self {
        Self::Notify(message.into())
    }

    /// Whether this error is the prober's high-traffic signal.
    ///
    /// High-traffic aborts take a long-cooldown recovery path and are never
    /// counted against the consecutive-failure limit.
    pub fn is_high_traffic(&self) -> bool {
        matches!(self, Self::HighTraffic { .. })
    }
}
