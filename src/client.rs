//! The Doubao API client.
//!
//! Three core operations compose linearly: [`generate_knowledge_network`]
//! builds a prompt and calls [`generate_text`], which wraps the prompt in a
//! one-message conversation and calls [`chat_completion`], which issues the
//! single HTTP request. Nothing is retried and nothing is cached.
//!
//! [`chat_completion`]: DoubaoClient::chat_completion
//! [`generate_text`]: DoubaoClient::generate_text
//! [`generate_knowledge_network`]: DoubaoClient::generate_knowledge_network

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, KnowledgeConfig};
use crate::error::ClientError;
use crate::knowledge::{self, KnowledgeNode};
use crate::llm::providers::{self, stub::StubTransport};
use crate::llm::{ChatRequest, Message, Transport};
use crate::prompt;

#[derive(Debug, Clone)]
pub struct DoubaoClient {
    config: ClientConfig,
    knowledge: KnowledgeConfig,
    transport: Transport,
}

impl DoubaoClient {
    /// Client with default endpoint, model and temperature.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::new(api_key))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = providers::build(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Client over an arbitrary transport, e.g. a [`StubTransport`].
    pub fn with_transport(config: ClientConfig, transport: Transport) -> Self {
        Self { config, knowledge: KnowledgeConfig::default(), transport }
    }

    /// Convenience for tests and offline demos.
    pub fn stubbed(stub: StubTransport) -> Self {
        Self::with_transport(ClientConfig::new("stub-key"), Transport::Stub(stub))
    }

    pub fn with_knowledge_config(mut self, knowledge: KnowledgeConfig) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `messages` in order and return the decoded response body.
    ///
    /// `model` and `temperature` fall back to the configured defaults. Neither
    /// is validated; the remote service is the judge.
    pub fn chat_completion(
        &self,
        messages: &[Message],
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<Value, ClientError> {
        if messages.is_empty() {
            return Err(ClientError::EmptyConversation);
        }

        let request = ChatRequest {
            model: model.unwrap_or(&self.config.model).to_string(),
            messages: messages.to_vec(),
            temperature: temperature.unwrap_or(self.config.temperature),
            max_tokens: self.config.max_tokens,
        };

        debug!(
            endpoint = %self.transport.endpoint(),
            model = %request.model,
            temperature = request.temperature,
            messages = request.messages.len(),
            "sending chat completion"
        );

        self.transport.send(&request)
    }

    /// Single-turn generation: returns the first choice's content unmodified.
    pub fn generate_text(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, ClientError> {
        let response = self.chat_completion(&[Message::user(prompt)], model, temperature)?;
        first_choice_content(&response)
    }

    /// Ask the model for a knowledge tree of `content` and decode it.
    ///
    /// The decoded value is returned as-is: a response that is valid JSON but
    /// ignores the requested `title`/`summary`/`children` shape is accepted.
    pub fn generate_knowledge_network(&self, content: &str) -> Result<Value, ClientError> {
        let content = match self.knowledge.max_content_chars {
            Some(max) => knowledge::truncate_content(content, max),
            None => content.into(),
        };
        let text = self.generate_text(
            &prompt::knowledge_network(&content),
            None,
            Some(self.knowledge.temperature),
        )?;
        knowledge::decode_model_json(&text)
    }

    /// [`generate_knowledge_network`](Self::generate_knowledge_network) as a
    /// typed tree.
    pub fn generate_knowledge_tree(&self, content: &str) -> Result<KnowledgeNode, ClientError> {
        let value = self.generate_knowledge_network(content)?;
        KnowledgeNode::from_value(&value)
    }

    /// Ask for 3-5 children of one node. Returns the decoded JSON.
    pub fn expand_node(&self, title: &str, summary: Option<&str>) -> Result<Value, ClientError> {
        let messages = [
            Message::system(prompt::EXPAND_NODE_SYSTEM),
            Message::user(prompt::expand_node(title, summary)),
        ];
        let response = self.chat_completion(&messages, None, None)?;
        knowledge::decode_model_json(&first_choice_content(&response)?)
    }

    /// Markdown explanation of one node, optionally placed on a learning path.
    pub fn explain_node(
        &self,
        title: &str,
        summary: Option<&str>,
        context: Option<&str>,
    ) -> Result<String, ClientError> {
        let messages = [
            Message::system(prompt::EXPLAIN_NODE_SYSTEM),
            Message::user(prompt::explain_node(title, summary, context)),
        ];
        let response = self.chat_completion(&messages, None, None)?;
        first_choice_content(&response)
    }

    /// One minimal round-trip. Returns the model's reply.
    pub fn test_connection(&self) -> Result<String, ClientError> {
        self.generate_text(prompt::PING_PROMPT, None, None)
    }
}

/// `choices[0].message.content`, or `InvalidResponse` carrying the body.
pub fn first_choice_content(response: &Value) -> Result<String, ClientError> {
    let content = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(Value::as_str);

    match content {
        Some(text) => Ok(text.to_string()),
        None => {
            warn!(response = %response, "response has no usable choices");
            Err(ClientError::InvalidResponse(response.to_string()))
        }
    }
}
