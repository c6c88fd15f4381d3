//! Configuration management for specforge
//!
//! Configuration is loaded once at run start from environment variables with
//! sensible defaults and passed by reference into the pipeline; there is no
//! ambient global.
//!
//! # Environment Variables
//!
//! - `SPECFORGE_PROVIDER`: Provider selection (ollama|openai|claude|gemini|grok|groq) - default: "ollama"
//! - `SPECFORGE_MODEL`: Model name - default: "qwen2.5-coder:7b"
//! - `SPECFORGE_TEMPERATURE`: Sampling temperature - default: "0.2"
//! - `SPECFORGE_MAX_TOKENS`: Max completion tokens - default: "2048"
//! - `SPECFORGE_REQUEST_TIMEOUT`: Completion timeout in seconds - default: "120"
//! - `SPECFORGE_MAX_RETRIES`: Completion retries after the first attempt - default: "3"
//! - `SPECFORGE_BACKOFF_MS`: Base backoff in milliseconds, doubled per retry - default: "500"
//! - `SPECFORGE_CONCURRENCY`: Max targets generated concurrently - default: "4"
//! - `SPECFORGE_OUTPUT_DIR`: Output directory - default: "generated"
//! - `SPECFORGE_TEMPLATE_DIR`: Project-local template override directory
//! - `SPECFORGE_SECURITY_AS_WARNING`: Downgrade security findings (true|false) - default: "false"
//! - `SPECFORGE_TOLERATE_PARTIAL`: Exit 0 on partial failure (true|false) - default: "false"
//! - `SPECFORGE_LOG_LEVEL`: Logging level - default: "info"
//!
//! Provider credentials are read by the genai library itself
//! (`OLLAMA_HOST`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...).

use genai::adapter::AdapterKind;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_MS: u64 = 500;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_OUTPUT_DIR: &str = "generated";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, claude, gemini, grok, groq")]
    InvalidProvider(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// How the assembler resolves two artifacts claiming the same output path
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Later-declared target wins
    OverwriteInDeclarationOrder,
    /// Collision is a fatal run-level error
    Reject,
    /// Move the artifact under a subdirectory named for its interface
    NamespaceByInterface,
}

/// Per-artifact-kind collision policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionConfig {
    pub logic: CollisionPolicy,
    pub interface: CollisionPolicy,
    pub docs: CollisionPolicy,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            logic: CollisionPolicy::Reject,
            interface: CollisionPolicy::NamespaceByInterface,
            docs: CollisionPolicy::OverwriteInDeclarationOrder,
        }
    }
}

/// Main configuration for a generation run
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// LLM provider (from genai)
    pub provider: AdapterKind,

    /// Model name to use for synthesis (provider-specific)
    pub model: String,

    /// Sampling temperature passed on every completion call
    pub temperature: f32,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Per-attempt completion timeout
    pub request_timeout: Duration,

    /// Retries after the first attempt before a target is declared failed
    pub max_retries: u32,

    /// Base backoff between retries, doubled per attempt
    pub backoff_base: Duration,

    /// Maximum generation targets in flight at once
    pub max_concurrency: usize,

    /// Root for the materialized package tree
    pub output_dir: PathBuf,

    /// Project-local template override directory
    pub template_dir: Option<PathBuf>,

    /// Downgrade security findings from fatal to warning
    pub security_as_warning: bool,

    /// Exit successfully even when some targets failed
    pub tolerate_partial: bool,

    /// Collision policies per artifact kind
    pub collision: CollisionConfig,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GenerationConfig {
    /// Loads from environment variables with defaults
    fn default() -> Self {
        Self {
            provider: env::var("SPECFORGE_PROVIDER")
                .ok()
                .and_then(|raw| parse_provider(&raw).ok())
                .unwrap_or(AdapterKind::Ollama),
            model: env::var("SPECFORGE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: parse_env("SPECFORGE_TEMPERATURE", DEFAULT_TEMPERATURE),
            max_tokens: parse_env("SPECFORGE_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            request_timeout: Duration::from_secs(parse_env(
                "SPECFORGE_REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            max_retries: parse_env("SPECFORGE_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            backoff_base: Duration::from_millis(parse_env(
                "SPECFORGE_BACKOFF_MS",
                DEFAULT_BACKOFF_MS,
            )),
            max_concurrency: parse_env("SPECFORGE_CONCURRENCY", DEFAULT_CONCURRENCY),
            output_dir: env::var("SPECFORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            template_dir: env::var("SPECFORGE_TEMPLATE_DIR").ok().map(PathBuf::from),
            security_as_warning: parse_env_bool("SPECFORGE_SECURITY_AS_WARNING", false),
            tolerate_partial: parse_env_bool("SPECFORGE_TOLERATE_PARTIAL", false),
            collision: CollisionConfig::default(),
            log_level: env::var("SPECFORGE_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl GenerationConfig {
    /// Validates the configuration, rejecting values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "temperature {} outside [0.0, 2.0]",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be positive".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "request timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// User-level template override directory (`~/.config/specforge/templates`)
    pub fn user_template_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("specforge").join("templates"))
    }
}

/// Parses a provider name into a genai AdapterKind
pub fn parse_provider(raw: &str) -> Result<AdapterKind, ConfigError> {
    let lower = raw.to_lowercase();
    let normalized = match lower.as_str() {
        "claude" => "anthropic",
        "grok" => "xai",
        other => other,
    };
    AdapterKind::from_lower_str(normalized)
        .ok_or_else(|| ConfigError::InvalidProvider(raw.to_string()))
}

fn parse_env<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn parse_env_bool(var: &str, default: bool) -> bool {
    match env::var(var) {
        Ok(raw) => matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}
