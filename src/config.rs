//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or
//! the file named by `DOUBAO_CONFIG`), then applies `DOUBAO_API_BASE_URL`,
//! `DOUBAO_MODEL` and `DOUBAO_LOG_LEVEL` overrides. The API key is taken from
//! `DOUBAO_API_KEY` only, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::llm::{
    DEFAULT_API_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_TOKENS, REQUEST_TIMEOUT_SECONDS,
};

/// Temperature used for structured knowledge-tree output.
pub const KNOWLEDGE_TEMPERATURE: f32 = 0.3;

/// Client settings. Immutable once handed to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub api_key: String,
    /// Model used when a call does not name one.
    pub model: String,
    /// Temperature used when a call does not pass one.
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
}

impl ClientConfig {
    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_seconds: REQUEST_TIMEOUT_SECONDS,
            max_tokens: MAX_TOKENS,
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Knowledge-tree generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeConfig {
    pub temperature: f32,
    /// Content longer than this many chars is cut before prompting.
    /// `None` embeds the content as given.
    pub max_content_chars: Option<usize>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self { temperature: KNOWLEDGE_TEMPERATURE, max_content_chars: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub log_level: String,
    /// Append logs here instead of stderr (already `~`-expanded).
    pub log_file: Option<PathBuf>,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub client: ClientConfig,
    pub knowledge: KnowledgeConfig,
    pub logging: LoggingConfig,
}

/// Env-sourced values applied on top of the TOML file.
/// Tests build this directly instead of mutating process env.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("DOUBAO_API_KEY").ok(),
            api_base_url: env::var("DOUBAO_API_BASE_URL").ok(),
            model: env::var("DOUBAO_MODEL").ok(),
            log_level: env::var("DOUBAO_LOG_LEVEL").ok(),
        }
    }
}

/// Raw TOML shape, deserialized before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    client: RawClient,
    #[serde(default)]
    knowledge: RawKnowledge,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Deserialize)]
struct RawClient {
    #[serde(default = "default_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
}

impl Default for RawClient {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Deserialize)]
struct RawKnowledge {
    #[serde(default = "default_knowledge_temperature")]
    temperature: f32,
    #[serde(default)]
    max_content_chars: Option<usize>,
}

impl Default for RawKnowledge {
    fn default() -> Self {
        Self { temperature: default_knowledge_temperature(), max_content_chars: None }
    }
}

#[derive(Deserialize)]
struct RawLogging {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
}

impl Default for RawLogging {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_file: None }
    }
}

fn default_api_base_url() -> String { DEFAULT_API_BASE_URL.to_string() }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_temperature() -> f32 { DEFAULT_TEMPERATURE }
fn default_timeout_seconds() -> u64 { REQUEST_TIMEOUT_SECONDS }
fn default_max_tokens() -> u32 { MAX_TOKENS }
fn default_knowledge_temperature() -> f32 { KNOWLEDGE_TEMPERATURE }
fn default_log_level() -> String { "info".to_string() }

/// Load config from `DOUBAO_CONFIG` or `config/default.toml`, then apply
/// env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let path = env::var("DOUBAO_CONFIG")
        .map(|p| expand_home(&p))
        .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
    load_from(&path, Overrides::from_env())
}

/// Inner loader taking an explicit path and overrides.
pub fn load_from(path: &Path, overrides: Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;
    Ok(resolve(parsed, overrides))
}

/// Resolve defaults + overrides without any file.
pub fn from_overrides(overrides: Overrides) -> Config {
    resolve(RawConfig::default(), overrides)
}

fn resolve(parsed: RawConfig, overrides: Overrides) -> Config {
    let c = parsed.client;
    Config {
        client: ClientConfig {
            api_base_url: overrides.api_base_url.unwrap_or(c.api_base_url),
            api_key: overrides.api_key.unwrap_or_default(),
            model: overrides.model.unwrap_or(c.model),
            temperature: c.temperature,
            timeout_seconds: c.timeout_seconds,
            max_tokens: c.max_tokens,
        },
        knowledge: KnowledgeConfig {
            temperature: parsed.knowledge.temperature,
            max_content_chars: parsed.knowledge.max_content_chars.filter(|&n| n > 0),
        },
        logging: LoggingConfig {
            log_level: overrides.log_level.unwrap_or(parsed.logging.log_level),
            log_file: parsed.logging.log_file.map(|p| expand_home(&p)),
        },
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
