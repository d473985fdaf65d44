// src/error.rs

//! Unified error handling for the portal client.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for portal operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No authenticated session is active
    #[error("Not authenticated: log in first")]
    NotAuthenticated,

    /// The portal answered with an error status
    #[error("Upstream HTTP error {status} for {url}")]
    UpstreamHttp { status: u16, url: String },

    /// Network or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Markup did not match any expected shape
    #[error("Parse failure: {0}")]
    Parse(String),

    /// An option value is not one of the supported choices
    #[error("Unsupported {option}: '{value}'")]
    UnsupportedOption { option: String, value: String },

    /// None of the candidate pages could be fetched
    #[error("Page not found: {0}")]
    NotFound(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl AppError {
    /// Create an upstream status error.
    pub fn upstream(status: u16, url: impl Into<String>) -> Self {
        Self::UpstreamHttp {
            status,
            url: url.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }

    /// Create a parse failure.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create an unsupported option error.
    pub fn unsupported(option: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnsupportedOption {
            option: option.into(),
            value: value.into(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The inspectable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::UpstreamHttp { .. } => ErrorKind::UpstreamHttpError,
            Self::Transport(_) => ErrorKind::TransportError,
            Self::Parse(_) | Self::Selector { .. } => ErrorKind::ParseFailure,
            Self::UnsupportedOption { .. } => ErrorKind::UnsupportedOption,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io(_)
            | Self::Json(_)
            | Self::Toml(_)
            | Self::Url(_)
            | Self::Config(_)
            | Self::Validation(_) => ErrorKind::Configuration,
        }
    }
}

/// Serializable error classification carried in error replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotAuthenticated,
    UpstreamHttpError,
    TransportError,
    ParseFailure,
    UnsupportedOption,
    NotFound,
    Configuration,
}
