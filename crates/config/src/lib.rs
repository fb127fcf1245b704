//! Configuration loading, validation, and management for the Assurance AI
//! validator.
//!
//! Loads configuration from `~/.assurance-ai/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! [`ValidatorConfig`] is passed explicitly to the orchestrator; nothing in
//! the pipeline reads global state.

use assurance_core::MatchDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.assurance-ai/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidatorConfig {
    /// Completion model settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Prompt budget settings
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Extension registry discovery
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Schema store and resolution strategy
    #[serde(default)]
    pub schemas: SchemaConfig,

    /// Tokenizer used for prompt cost accounting
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

// ── Model ─────────────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model or deployment name
    #[serde(default = "default_model")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Stop sequences sent with every request
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

fn default_model() -> String {
    "gpt-35-turbo".into()
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.9
}
fn default_stop() -> Vec<String> {
    vec!["EOF".into()]
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_key: None,
            api_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            stop: default_stop(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("stop", &self.stop)
            .finish()
    }
}

// ── Budget ────────────────────────────────────────────────────────────────

/// How events (and schemas) are rendered into the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptFormat {
    /// JSON (events as an array, schema as the raw document)
    #[default]
    Json,
    /// One natural-language sentence per event / rule list for the schema
    Sentences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Hard ceiling on prompt tokens (schema + template + events)
    #[serde(default = "default_token_limit")]
    pub token_limit: usize,

    #[serde(default)]
    pub event_format: PromptFormat,

    #[serde(default)]
    pub schema_format: PromptFormat,

    /// Replaces the built-in validation prompt template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

fn default_token_limit() -> usize {
    2048
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            token_limit: default_token_limit(),
            event_format: PromptFormat::default(),
            schema_format: PromptFormat::default(),
            template: None,
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// How many hub shared-state events to scan for the latest registry
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Coarse event classifier that SDK events carry
    #[serde(default = "default_event_kind")]
    pub event_kind: String,
}

fn default_lookback() -> usize {
    100
}
fn default_event_kind() -> String {
    "generic".into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            event_kind: default_event_kind(),
        }
    }
}

// ── Schemas ───────────────────────────────────────────────────────────────

/// How an extension is mapped to its schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
    /// Static extension → matcher map only
    #[default]
    Exact,
    /// Embedding similarity only
    Semantic,
    /// Static map first, similarity search as fallback
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub strategy: ResolverStrategy,

    /// Directory of `*.json` schemas, or one JSON file holding an array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Minimum cosine similarity for a semantic match
    #[serde(default)]
    pub min_score: f32,

    /// Extensions to validate, keyed by friendly name or extension id
    #[serde(default = "default_extensions")]
    pub extensions: BTreeMap<String, ExtensionMatcher>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            strategy: ResolverStrategy::default(),
            path: None,
            min_score: 0.0,
            extensions: default_extensions(),
        }
    }
}

/// The events relevant to one extension, and the schema they validate against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionMatcher {
    #[serde(rename = "type")]
    pub event_type: String,

    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,

    /// Schema store key. When absent the schema is found by type/source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl ExtensionMatcher {
    pub fn descriptor(&self) -> MatchDescriptor {
        MatchDescriptor {
            event_type: self.event_type.clone(),
            source: self.source.clone(),
            name: self.name.clone(),
            count: self.count,
        }
    }
}

fn default_extensions() -> BTreeMap<String, ExtensionMatcher> {
    let mut map = BTreeMap::new();
    map.insert(
        "Analytics".to_string(),
        ExtensionMatcher {
            event_type: "com.adobe.eventtype.analytics".into(),
            source: "com.adobe.eventsource.responsecontent".into(),
            name: None,
            count: Some(2),
            schema: None,
        },
    );
    map
}

// ── Tokenizer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// BPE encoding: "cl100k_base", "o200k_base", "p50k_base"
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Hugging Face `tokenizer.json`; takes precedence over `encoding`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_encoding() -> String {
    "cl100k_base".into()
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            path: None,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────

impl ValidatorConfig {
    /// Load configuration from the default path (~/.assurance-ai/config.toml).
    ///
    /// Environment overrides:
    /// - `ASSURANCE_AI_API_KEY`
    /// - `ASSURANCE_AI_MODEL`
    /// - `ASSURANCE_AI_TOKEN_LIMIT`
    /// - `ASSURANCE_AI_SCHEMAS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides and re-validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.model.api_key.is_none() {
            self.model.api_key = var("ASSURANCE_AI_API_KEY");
        }
        if let Some(model) = var("ASSURANCE_AI_MODEL") {
            self.model.name = model;
        }
        if let Some(limit) = var("ASSURANCE_AI_TOKEN_LIMIT") {
            self.budget.token_limit = limit.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ASSURANCE_AI_TOKEN_LIMIT must be a positive integer, got '{limit}'"
                ))
            })?;
        }
        if let Some(path) = var("ASSURANCE_AI_SCHEMAS") {
            self.schemas.path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".assurance-ai")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget.token_limit == 0 {
            return Err(ConfigError::ValidationError(
                "budget.token_limit must be greater than 0".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.registry.lookback == 0 {
            return Err(ConfigError::ValidationError(
                "registry.lookback must be greater than 0".into(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.schemas.min_score) {
            return Err(ConfigError::ValidationError(
                "schemas.min_score must be between -1.0 and 1.0".into(),
            ));
        }

        for (name, matcher) in &self.schemas.extensions {
            if matcher.event_type.trim().is_empty() || matcher.source.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "schemas.extensions.{name} needs a non-empty type and source"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("{path} is not valid TOML: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
