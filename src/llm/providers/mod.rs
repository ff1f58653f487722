//! Transport implementations.
//!
//! `build(config)` is the factory for the real HTTP transport. The stub is
//! constructed directly by whoever needs it.

pub mod http;
pub mod stub;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::llm::Transport;

/// Construct the HTTP transport from a resolved client config.
pub fn build(config: &ClientConfig) -> Result<Transport, ClientError> {
    let t = http::HttpTransport::new(
        config.api_base_url.clone(),
        &config.api_key,
        config.timeout_seconds,
    )?;
    Ok(Transport::Http(t))
}
