//! Stub transport: answers from a queue of canned replies and records every
//! request body it receives. Used to exercise the client without a network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::error::ClientError;
use crate::llm::ChatRequest;

#[derive(Debug, Clone)]
pub enum StubReply {
    /// Returned verbatim as the decoded response body.
    Json(Value),
    /// Non-2xx status with the given body.
    Status(StatusCode, String),
}

#[derive(Debug, Default)]
struct StubState {
    replies: VecDeque<StubReply>,
    requests: Vec<ChatRequest>,
}

/// Clones share the same queue and request log.
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw JSON body.
    pub fn push_json(&self, body: Value) -> &Self {
        self.lock().replies.push_back(StubReply::Json(body));
        self
    }

    /// Queue a well-formed completion whose first choice carries `content`.
    pub fn push_content(&self, content: impl Into<String>) -> &Self {
        self.push_json(completion_body(&content.into()))
    }

    /// Queue an HTTP error.
    pub fn push_status(&self, status: StatusCode, body: impl Into<String>) -> &Self {
        self.lock().replies.push_back(StubReply::Status(status, body.into()));
        self
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.lock().requests.last().cloned()
    }

    pub fn pending(&self) -> usize {
        self.lock().replies.len()
    }

    pub fn send(&self, request: &ChatRequest) -> Result<Value, ClientError> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        match state.replies.pop_front() {
            Some(StubReply::Json(body)) => Ok(body),
            Some(StubReply::Status(status, body)) => Err(ClientError::HttpStatus { status, body }),
            None => Err(ClientError::HttpStatus {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "stub transport has no queued reply".into(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        // A panic while holding the lock leaves the queue intact; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Minimal OpenAI-style completion body wrapping `content`.
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "stub-completion",
        "object": "chat.completion",
        "model": "stub",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}
