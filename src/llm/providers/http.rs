//! Blocking HTTPS transport for `/v1/chat/completions`.
//!
//! Request headers (`Content-Type`, bearer `Authorization`) are derived once
//! at construction and installed as client defaults. Every `send` is exactly
//! one POST: no retry, no streaming, no connection reuse guarantees beyond
//! what `reqwest` does internally.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::error::ClientError;
use crate::llm::ChatRequest;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_base_url: String,
}

impl HttpTransport {
    /// Build a transport for `api_base_url` authenticated with `api_key`.
    ///
    /// The key format is not validated; construction only fails when the key
    /// cannot be carried in an HTTP header or the TLS backend fails to load.
    pub fn new(
        api_base_url: String,
        api_key: &str,
        timeout_seconds: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .default_headers(default_headers(api_key)?)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self { client, api_base_url })
    }

    pub fn endpoint(&self) -> &str {
        &self.api_base_url
    }

    pub fn send(&self, request: &ChatRequest) -> Result<Value, ClientError> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(request)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full request payload");
        }

        let response = self
            .client
            .post(&self.api_base_url)
            .json(request)
            .send()
            .map_err(|e| {
                error!(
                    url = %self.api_base_url,
                    error = %e,
                    is_timeout = e.is_timeout(),
                    "API request failed (transport)"
                );
                ClientError::Transport(e)
            })?;

        let response = check_status(response)?;

        let body = response.text().map_err(|e| {
            error!(error = %e, "failed to read response body");
            ClientError::Transport(e)
        })?;

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body = %body, "response body is not valid JSON");
            ClientError::InvalidResponse(format!("response body is not JSON ({e}): {body}"))
        })?;

        debug!(bytes = body.len(), "received API response");
        trace!(response = %body, "full response payload");

        Ok(parsed)
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap, ClientError> {
    let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|e| ClientError::Build(format!("API key is not a valid header value: {e}")))?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

// Error envelope used by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<Value>,
}

/// Pass a 2xx response through; turn anything else into `HttpStatus`
/// carrying the remote body.
fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => {
            let code = env
                .error
                .code
                .map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_default();
            error!(%status, %code, api_message = %env.error.message, body = %body, "API returned HTTP error");
        }
        Err(_) => error!(%status, body = %body, "API returned HTTP error"),
    }

    Err(ClientError::HttpStatus { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MAX_TOKENS, Message};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve exactly one HTTP response on a random local port. The handle
    /// yields the raw request (head + body) the server received.
    fn serve_once(status: &str, content_type: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0_u8; 8192];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8(raw).unwrap()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..head_end]
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= head_end + 4 + content_length
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "doubao-pro-32k".into(),
            messages: vec![Message::system("be brief"), Message::user("hi")],
            temperature: 0.7,
            max_tokens: MAX_TOKENS,
        }
    }

    #[test]
    fn ok_response_decodes_and_request_is_well_formed() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let (url, server) = serve_once("200 OK", "application/json", body);
        let t = HttpTransport::new(url, "sk-1", 5).unwrap();

        let v = t.send(&request()).unwrap();
        assert_eq!(v["choices"][0]["message"]["content"], "hello");

        let raw = server.join().unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /v1/chat/completions "), "{raw}");
        assert!(lower.contains("authorization: bearer sk-1"), "{raw}");
        assert!(lower.contains("content-type: application/json"), "{raw}");
        assert!(raw.contains(r#""max_tokens":2048"#), "{raw}");
        assert!(
            raw.contains(r#""messages":[{"role":"system","content":"be brief"},{"role":"user","content":"hi"}]"#),
            "{raw}"
        );
    }

    #[test]
    fn error_status_keeps_remote_body() {
        let body = r#"{"error":{"message":"invalid api key","code":"unauthorized"}}"#;
        let (url, server) = serve_once("401 Unauthorized", "application/json", body);
        let t = HttpTransport::new(url, "sk-bad", 5).unwrap();

        let err = t.send(&request()).unwrap_err();
        match &err {
            ClientError::HttpStatus { status, body: got } => {
                assert_eq!(*status, reqwest::StatusCode::UNAUTHORIZED);
                assert_eq!(got, body);
            }
            other => panic!("expected HttpStatus, got {other}"),
        }
        assert!(err.to_string().starts_with("HTTP 401"));
        server.join().unwrap();
    }

    #[test]
    fn non_json_success_body_is_invalid_response() {
        let (url, server) = serve_once("200 OK", "text/html", "<html>maintenance</html>");
        let t = HttpTransport::new(url, "sk-1", 5).unwrap();

        let err = t.send(&request()).unwrap_err();
        match &err {
            ClientError::InvalidResponse(msg) => assert!(msg.contains("<html>maintenance</html>")),
            other => panic!("expected InvalidResponse, got {other}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn constructs_transport() {
        let t = HttpTransport::new(
            "http://127.0.0.1:9/v1/chat/completions".to_string(),
            "test-key",
            5,
        );
        assert!(t.is_ok());
        assert_eq!(t.unwrap().endpoint(), "http://127.0.0.1:9/v1/chat/completions");
    }

    #[test]
    fn headers_carry_bearer_token() {
        let headers = default_headers("abc123").unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer abc123");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn key_with_newline_is_rejected() {
        let err = default_headers("bad\nkey").unwrap_err();
        assert!(matches!(err, ClientError::Build(_)));
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) is closed on any sane test host.
        let t = HttpTransport::new("http://127.0.0.1:9/v1/chat/completions".into(), "k", 2)
            .unwrap();
        let req = ChatRequest {
            model: "m".into(),
            messages: vec![crate::llm::Message::user("hi")],
            temperature: 0.0,
            max_tokens: 1,
        };
        let err = t.send(&req).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.is_remote());
    }
}
