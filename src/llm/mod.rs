//! Chat completion wire model and transport abstraction.
//!
//! `Transport` is an enum over concrete transports. `Http` talks to the real
//! endpoint; `Stub` answers from an in-process queue and records every
//! request body, so client logic can be exercised without a network.
//!
//! Everything here is synchronous: one call, one request, one response.

pub mod providers;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Default chat completions endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.doubao.com/v1/chat/completions";
/// Model used when the caller does not name one.
pub const DEFAULT_MODEL: &str = "doubao-pro-32k";
/// Sampling temperature used when the caller does not pass one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Upper bound on generated tokens sent with every request.
pub const MAX_TOKENS: u32 = 2048;
/// Per-request timeout.
pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Request body for `POST /chat/completions`.
///
/// `messages` keeps the caller's order verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

// ── Transport enum ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Transport {
    Http(providers::http::HttpTransport),
    Stub(providers::stub::StubTransport),
}

impl Transport {
    /// Send one request and return the decoded JSON body.
    pub fn send(&self, request: &ChatRequest) -> Result<Value, ClientError> {
        match self {
            Transport::Http(t) => t.send(request),
            Transport::Stub(t) => t.send(request),
        }
    }

    /// Endpoint label for log lines.
    pub fn endpoint(&self) -> &str {
        match self {
            Transport::Http(t) => t.endpoint(),
            Transport::Stub(_) => "stub",
        }
    }
}
