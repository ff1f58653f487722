//! Error types.
//!
//! [`ClientError`] is what every [`DoubaoClient`](crate::client::DoubaoClient)
//! operation returns on failure; [`AppError`] wraps it for the application
//! layer (config, logging, demo entry point).

use reqwest::StatusCode;
use thiserror::Error;

// ── Client errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure, connection refused, or timeout.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    /// A 2xx response whose JSON lacks a usable `choices` list.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Model text that is not valid JSON after fence stripping.
    #[error("failed to decode model output as JSON: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("conversation must contain at least one message")]
    EmptyConversation,
}

impl ClientError {
    /// Raw model text attached to a decode failure.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ClientError::Decode { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// `true` for failures that happened on the wire (transport or status).
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::HttpStatus { .. })
    }
}

// ── Application errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}
