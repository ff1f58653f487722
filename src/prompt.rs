//! Prompt templates and a small builder for filling them.
//!
//! Variable substitution uses `{{key}}` syntax and happens in a single pass
//! at [`build()`](PromptBuilder::build) time, so substituted text is never
//! rescanned: course content that happens to contain `{{title}}` stays as
//! written. Unknown placeholders are left untouched.

use std::collections::HashMap;

const SEPARATOR: &str = "\n\n";

/// Instruction for turning course material into a knowledge tree.
/// Variables: `content`.
pub const KNOWLEDGE_NETWORK_TEMPLATE: &str =
    include_str!("../config/prompts/knowledge_network.txt");

/// Instruction for growing one node. Variables: `title`, `summary`.
pub const EXPAND_NODE_TEMPLATE: &str = include_str!("../config/prompts/expand_node.txt");

pub const EXPAND_NODE_SYSTEM: &str = "你是教育内容分析助手。";

/// Instruction for explaining one node. Variables: `title`, `details`.
pub const EXPLAIN_NODE_TEMPLATE: &str = include_str!("../config/prompts/explain_node.txt");

pub const EXPLAIN_NODE_SYSTEM: &str = "你是专业教育辅导老师，精通Markdown和LaTeX。";

/// Prompt sent by [`DoubaoClient::test_connection`](crate::DoubaoClient::test_connection).
pub const PING_PROMPT: &str = "你好";

/// Fluent builder that joins text fragments and fills `{{key}}` placeholders.
///
/// ```
/// use doubao_client::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .append("Summarise: {{items}}")
///     .var("items", "item 1, item 2")
///     .build();
/// assert_eq!(prompt, "Summarise: item 1, item 2");
/// ```
#[derive(Debug, Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Fragments are trimmed; empty ones are dropped.
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    /// Register `{{key}}` → `value` substitution pairs applied at build time.
    pub fn with_vars<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (k, v) in vars {
            self.vars.insert(k.to_string(), v.to_string());
        }
        self
    }

    /// Register a single variable.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Join all fragments with blank lines and substitute variables.
    pub fn build(self) -> String {
        let joined = self.parts.join(SEPARATOR);
        substitute(&joined, &self.vars)
    }
}

fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => match vars.get(after[..end].trim()) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str("{{");
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Knowledge-network instruction with `content` embedded.
pub fn knowledge_network(content: &str) -> String {
    PromptBuilder::new()
        .append(KNOWLEDGE_NETWORK_TEMPLATE)
        .var("content", content)
        .build()
}

pub fn expand_node(title: &str, summary: Option<&str>) -> String {
    PromptBuilder::new()
        .append(EXPAND_NODE_TEMPLATE)
        .with_vars([("title", title), ("summary", summary.unwrap_or(""))])
        .build()
}

pub fn explain_node(title: &str, summary: Option<&str>, context: Option<&str>) -> String {
    let mut details = Vec::new();
    if let Some(s) = summary.filter(|s| !s.trim().is_empty()) {
        details.push(format!("摘要：{s}"));
    }
    if let Some(c) = context.filter(|c| !c.trim().is_empty()) {
        details.push(format!("学习路径：{c}"));
    }
    PromptBuilder::new()
        .append(EXPLAIN_NODE_TEMPLATE)
        .var("title", title)
        .var("details", details.join("\n"))
        .build()
}
