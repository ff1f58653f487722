// Library root. The demo binary in src/main.rs and the integration tests
// under tests/ both go through this public surface.

pub mod client;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod logger;
pub mod prompt;

pub use client::DoubaoClient;
pub use config::{ClientConfig, Config, KnowledgeConfig};
pub use error::{AppError, ClientError};
pub use knowledge::KnowledgeNode;
pub use llm::providers::stub::StubTransport;
pub use llm::{Message, Role};
