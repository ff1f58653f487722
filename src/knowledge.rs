//! Knowledge-tree model and post-processing of model output.
//!
//! The tree is whatever the remote model returned: decoding guarantees valid
//! JSON, nothing more. [`KnowledgeNode::from_value`] is lenient about missing
//! fields (they come back empty) but every node, at every depth, must be a
//! JSON object.

use std::borrow::Cow;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::error::ClientError;

/// Appended to content cut by [`truncate_content`].
pub const TRUNCATION_MARKER: &str = "...(内容已截断)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KnowledgeNode {
    pub title: String,
    pub summary: String,
    pub children: Vec<KnowledgeNode>,
}

// Derived struct deserialization also accepts sequences (fields by position),
// which would turn `["a", "b"]` into a node. Go through `Value` instead.
impl<'de> Deserialize<'de> for KnowledgeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        node_from_value(&value, "$").map_err(D::Error::custom)
    }
}

fn node_from_value(value: &Value, path: &str) -> Result<KnowledgeNode, String> {
    let Value::Object(map) = value else {
        return Err(format!("{path}: expected a JSON object, found {}", kind(value)));
    };

    let children = match map.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, child)| node_from_value(child, &format!("{path}.children[{i}]")))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(format!("{path}.children: expected an array, found {}", kind(other)));
        }
    };

    Ok(KnowledgeNode {
        title: string_field(map, "title", path)?,
        summary: string_field(map, "summary", path)?,
        children,
    })
}

fn string_field(map: &Map<String, Value>, key: &str, path: &str) -> Result<String, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("{path}.{key}: expected a string, found {}", kind(other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl KnowledgeNode {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self { title: title.into(), summary: summary.into(), children: Vec::new() }
    }

    pub fn with_child(mut self, child: KnowledgeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Convert a decoded value. Fails when any node is not an object, when
    /// `children` is not an array, or when `title`/`summary` is not a string.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        node_from_value(value, "$").map_err(|msg| ClientError::Decode {
            source: serde_json::Error::custom(msg),
            raw: value.to_string(),
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(KnowledgeNode::node_count).sum::<usize>()
    }

    /// Levels in the tree; a lone node has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(KnowledgeNode::depth).max().unwrap_or(0)
    }
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` fence and a trailing
/// ```` ``` ```` fence, then trim.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Strip fences and decode. On failure the raw model text travels with the
/// error.
pub fn decode_model_json(text: &str) -> Result<Value, ClientError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|source| {
        error!(error = %source, raw = %text, "model output is not valid JSON");
        ClientError::Decode { source, raw: text.to_string() }
    })
}

/// Cut `content` to `max_chars` chars and append [`TRUNCATION_MARKER`].
/// Content within the limit is borrowed unchanged.
pub fn truncate_content(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &content[..byte_idx])),
        None => Cow::Borrowed(content),
    }
}
