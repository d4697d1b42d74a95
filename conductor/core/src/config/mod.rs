//! TOML Configuration File Support
//!
//! Centralized configuration loading for the chat interface, supporting a
//! TOML configuration file at `~/.config/ollama-chat/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the binary through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/ollama-chat/config.toml` (typically `~/.config/ollama-chat/config.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! scheme = "http"
//! host = "localhost"
//! port = 11434
//! connect_timeout_ms = 5000
//!
//! [process]
//! manage = true
//! name = "ollama"
//! command = "ollama"
//! args = ["serve"]
//! startup_delay_ms = 2000
//!
//! [models]
//! allowed = ["gemma3:12b", "llama3.2:latest", "mistral:latest"]
//! default = "llama3.2:latest"
//!
//! [chat]
//! title = "Ollama Chat Interface"
//! prompt_mode = "flat"
//! temperature = 0.7
//!
//! [logging]
//! file = "/tmp/ollama-chat.log"
//! filter = "ollama_chat=debug,chat_conductor=debug"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendConfig, ProcessSettings};
use crate::conductor::ConductorConfig;
use crate::models::{ModelCatalog, DEFAULT_MODELS};
use crate::prompt::PromptMode;

/// Default window title
pub const DEFAULT_TITLE: &str = "Ollama Chat Interface";

/// Default tracing filter directives
pub const DEFAULT_LOG_FILTER: &str = "ollama_chat=info,chat_conductor=info";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// `http` or `https`
    pub scheme: Option<String>,

    /// Ollama host
    pub host: Option<String>,

    /// Ollama port
    pub port: Option<u16>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
}

/// Process section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessToml {
    /// Whether to check for and launch the server
    pub manage: Option<bool>,

    /// Process name to look for
    pub name: Option<String>,

    /// Program that starts the server
    pub command: Option<String>,

    /// Arguments for the program
    pub args: Option<Vec<String>>,

    /// Wait after launch in milliseconds
    pub startup_delay_ms: Option<u64>,
}

/// Models section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsToml {
    /// Selectable models, in display order
    pub allowed: Option<Vec<String>>,

    /// Model selected at startup
    pub default: Option<String>,
}

/// Chat section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Window title
    pub title: Option<String>,

    /// `flat` or `structured`
    pub prompt_mode: Option<PromptMode>,

    /// System prompt sent with every generation
    pub system_prompt: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

/// Logging section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// Log file path
    pub file: Option<PathBuf>,

    /// Tracing filter directives
    pub filter: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfigToml {
    /// Backend connection section
    pub backend: BackendToml,

    /// Server process section
    pub process: ProcessToml,

    /// Model list section
    pub models: ModelsToml,

    /// Chat behavior section
    pub chat: ChatToml,

    /// Logging section
    pub logging: LoggingToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Centralized configuration for the chat interface
///
/// Consolidates all configuration sources. Use [`load_config`] to load it with
/// proper priority handling, then [`ChatConfig::validate`] before use.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Backend connection
    pub backend: BackendConfig,

    /// Server process handling
    pub process: ProcessSettings,

    /// Selectable models, in display order
    pub allowed_models: Vec<String>,

    /// Model selected at startup (first allowed model when unset)
    pub default_model: Option<String>,

    /// Window title
    pub title: String,

    /// How history is sent to the backend
    pub prompt_mode: PromptMode,

    /// System prompt sent with every generation
    pub system_prompt: Option<String>,

    /// Sampling temperature (backend default when unset)
    pub temperature: Option<f32>,

    /// Log file path (logging disabled when unset)
    pub log_file: Option<PathBuf>,

    /// Tracing filter directives
    pub log_filter: String,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            process: ProcessSettings::default(),
            allowed_models: DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect(),
            default_model: None,
            title: DEFAULT_TITLE.to_string(),
            prompt_mode: PromptMode::Flat,
            system_prompt: None,
            temperature: None,
            log_file: default_log_path(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ChatConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check every value that can be wrong
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.backend.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "backend.scheme must be http or https, got '{}'",
                self.backend.scheme
            )));
        }
        if self.backend.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.host must not be empty".to_string(),
            ));
        }
        if self.backend.port == 0 {
            return Err(ConfigError::ValidationError(
                "backend.port must be non-zero".to_string(),
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "chat.temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }
        if self.process.manage && self.process.command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "process.command must not be empty".to_string(),
            ));
        }
        self.catalog().map(|_| ())
    }

    /// Validated model catalog
    ///
    /// # Errors
    ///
    /// Fails when the allowed list is empty or the default is not in it.
    pub fn catalog(&self) -> Result<ModelCatalog, ConfigError> {
        ModelCatalog::new(self.allowed_models.clone(), self.default_model.clone())
    }

    /// Settings for the conductor
    ///
    /// # Errors
    ///
    /// Fails when validation fails.
    pub fn conductor_config(&self) -> Result<ConductorConfig, ConfigError> {
        self.validate()?;
        Ok(ConductorConfig {
            catalog: self.catalog()?,
            title: self.title.clone(),
            prompt_mode: self.prompt_mode,
            system_prompt: self.system_prompt.clone(),
            temperature: self.temperature,
            process: self.process.clone(),
        })
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/ollama-chat/config.toml` or
/// `~/.config/ollama-chat/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ollama-chat").join("config.toml"))
}

/// Get the default log file path (`~/.cache/ollama-chat/ollama-chat.log`)
#[must_use]
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("ollama-chat").join("ollama-chat.log"))
}

/// Load configuration from the default path, then the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ChatConfig, ConfigError> {
    load_config_from_path(default_config_path().as_deref())
}

/// Load configuration from a specific path, then the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<&Path>) -> Result<ChatConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `lookup` in place of the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_with_env<F>(path: Option<&Path>, lookup: F) -> Result<ChatConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ChatConfig::default();

    if let Some(config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.to_path_buf(),
                    source: e,
                })?;

            let toml_config: ChatConfigToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.to_path_buf());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, lookup);

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ChatConfig, toml: &ChatConfigToml) {
    // Backend
    if let Some(ref scheme) = toml.backend.scheme {
        config.backend.scheme = scheme.trim().to_lowercase();
    }
    if let Some(ref host) = toml.backend.host {
        config.backend.host.clone_from(host);
    }
    if let Some(port) = toml.backend.port {
        config.backend.port = port;
    }
    if let Some(ms) = toml.backend.connect_timeout_ms {
        config.backend.connect_timeout = Duration::from_millis(ms);
    }

    // Process
    if let Some(manage) = toml.process.manage {
        config.process.manage = manage;
    }
    if let Some(ref name) = toml.process.name {
        config.process.name.clone_from(name);
    }
    if let Some(ref command) = toml.process.command {
        config.process.command.clone_from(command);
    }
    if let Some(ref args) = toml.process.args {
        config.process.args.clone_from(args);
    }
    if let Some(ms) = toml.process.startup_delay_ms {
        config.process.startup_delay = Duration::from_millis(ms);
    }

    // Models
    if let Some(ref allowed) = toml.models.allowed {
        config.allowed_models.clone_from(allowed);
    }
    if toml.models.default.is_some() {
        config.default_model.clone_from(&toml.models.default);
    }

    // Chat
    if let Some(ref title) = toml.chat.title {
        config.title.clone_from(title);
    }
    if let Some(mode) = toml.chat.prompt_mode {
        config.prompt_mode = mode;
    }
    if toml.chat.system_prompt.is_some() {
        config.system_prompt.clone_from(&toml.chat.system_prompt);
    }
    if toml.chat.temperature.is_some() {
        config.temperature = toml.chat.temperature;
    }

    // Logging
    if toml.logging.file.is_some() {
        config.log_file.clone_from(&toml.logging.file);
    }
    if let Some(ref filter) = toml.logging.filter {
        config.log_filter.clone_from(filter);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut ChatConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("OLLAMA_HOST") {
        match parse_host(&value) {
            Some(target) => {
                target.apply(&mut config.backend);
                config.source = ConfigSource::Env;
            }
            None => tracing::warn!(value = %value, "Ignoring unparsable OLLAMA_HOST"),
        }
    }
    if let Some(value) = lookup("OLLAMA_PORT") {
        if let Ok(port) = value.trim().parse::<u16>() {
            config.backend.port = port;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(value) = lookup("OLLAMA_CHAT_MODELS") {
        let models: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        if !models.is_empty() {
            config.allowed_models = models;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(model) = lookup("OLLAMA_CHAT_DEFAULT_MODEL") {
        config.default_model = Some(model.trim().to_string());
        config.source = ConfigSource::Env;
    }
    if let Some(value) = lookup("OLLAMA_CHAT_MANAGE_BACKEND") {
        match parse_flag(&value) {
            Some(manage) => {
                config.process.manage = manage;
                config.source = ConfigSource::Env;
            }
            None => tracing::warn!(value = %value, "Ignoring OLLAMA_CHAT_MANAGE_BACKEND"),
        }
    }
    if let Some(value) = lookup("OLLAMA_CHAT_PROMPT_MODE") {
        match value.parse::<PromptMode>() {
            Ok(mode) => {
                config.prompt_mode = mode;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring OLLAMA_CHAT_PROMPT_MODE"),
        }
    }
    if let Some(prompt) = lookup("OLLAMA_CHAT_SYSTEM_PROMPT") {
        config.system_prompt = Some(prompt);
        config.source = ConfigSource::Env;
    }
    if let Some(path) = lookup("OLLAMA_CHAT_LOG") {
        config.log_file = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
}

/// Parsed `OLLAMA_HOST` value
#[derive(Clone, Debug, PartialEq, Eq)]
struct HostTarget {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl HostTarget {
    fn apply(self, backend: &mut BackendConfig) {
        backend.scheme = self.scheme;
        backend.host = self.host;
        if let Some(port) = self.port {
            backend.port = port;
        }
    }
}

/// Parse an `OLLAMA_HOST` value
///
/// Accepts `host`, `host:port`, `[v6addr]:port` and `scheme://host[:port]/`.
/// Without a scheme `http` is assumed and a missing port keeps the configured
/// one; with an explicit scheme a missing port means the scheme's default.
fn parse_host(value: &str) -> Option<HostTarget> {
    let value = value.trim().trim_end_matches('/');
    if value.is_empty() {
        return None;
    }

    let has_scheme = value.contains("://");
    let url = if has_scheme {
        reqwest::Url::parse(value)
    } else {
        reqwest::Url::parse(&format!("http://{value}"))
    }
    .ok()?;

    let scheme = url.scheme().to_string();
    if !matches!(scheme.as_str(), "http" | "https") {
        return None;
    }

    let host = url
        .host_str()?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    if host.is_empty() {
        return None;
    }

    let port = if has_scheme {
        url.port_or_known_default()
    } else {
        // The url crate hides a port equal to the scheme default
        url.port().or_else(|| value.ends_with(":80").then_some(80))
    };

    Some(HostTarget { scheme, host, port })
}

/// Read a boolean switch from an environment value
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Host override
    pub host: Option<String>,

    /// Port override
    pub port: Option<u16>,

    /// Startup model override
    pub default_model: Option<String>,

    /// Process management override
    pub manage_backend: Option<bool>,

    /// Prompt mode override
    pub prompt_mode: Option<PromptMode>,

    /// Log file override
    pub log_file: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host override
    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set startup model override
    #[must_use]
    pub fn with_default_model(mut self, model: String) -> Self {
        self.default_model = Some(model);
        self
    }

    /// Set process management override
    #[must_use]
    pub fn with_manage_backend(mut self, manage: bool) -> Self {
        self.manage_backend = Some(manage);
        self
    }

    /// Set prompt mode override
    #[must_use]
    pub fn with_prompt_mode(mut self, mode: PromptMode) -> Self {
        self.prompt_mode = Some(mode);
        self
    }

    /// Set log file override
    #[must_use]
    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ChatConfig) {
        if self.host.is_some()
            || self.port.is_some()
            || self.default_model.is_some()
            || self.manage_backend.is_some()
            || self.prompt_mode.is_some()
            || self.log_file.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref host) = self.host {
            match parse_host(host) {
                Some(target) => target.apply(&mut config.backend),
                None => config.backend.host.clone_from(host),
            }
        }
        if let Some(port) = self.port {
            config.backend.port = port;
        }
        if let Some(ref model) = self.default_model {
            config.default_model = Some(model.clone());
        }
        if let Some(manage) = self.manage_backend {
            config.process.manage = manage;
        }
        if let Some(mode) = self.prompt_mode {
            config.prompt_mode = mode;
        }
        if let Some(ref path) = self.log_file {
            config.log_file = Some(path.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
