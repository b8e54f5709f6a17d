//! Error types for the REST client.

use thiserror::Error;

use crate::i18n::{Locale, MessageKey};

/// Everything a backend call can fail with.
///
/// None of these are fatal; screens show [`ApiError::user_message`] and let
/// the user retry or navigate away.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never completed (DNS, connect, timeout, reset).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Display-ready message, already localized or taken from the server.
        message: String,
        /// Machine-readable error code from the body, if any.
        code: Option<String>,
    },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// An authenticated call was attempted with no session.
    #[error("Not logged in")]
    Unauthenticated,

    /// Message text was empty after trimming.
    #[error("Message text is empty")]
    EmptyMessage,

    /// A local thread lookup failed.
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// The caller cancelled the operation; any late response was discarded.
    #[error("Request cancelled")]
    Cancelled,

    /// The event stream reported an error.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Stream ended unexpectedly.
    #[error("Stream ended unexpectedly")]
    StreamEnded,
}

impl ApiError {
    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self, locale: Locale) -> String {
        let key = match self {
            Self::Status { message, .. } => return message.clone(),
            Self::Transport(_) => MessageKey::Network,
            Self::InvalidUrl(_) | Self::Config(_) => MessageKey::InvalidConfig,
            Self::Unauthenticated => MessageKey::LoginRequired,
            Self::EmptyMessage => MessageKey::EmptyMessage,
            Self::ThreadNotFound(_) => MessageKey::ThreadNotFound,
            Self::Cancelled => MessageKey::Cancelled,
            Self::Stream(_) | Self::StreamEnded => MessageKey::StreamInterrupted,
        };
        key.text(locale).to_string()
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
