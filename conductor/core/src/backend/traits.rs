//! LLM Backend Traits
//!
//! Trait definitions for the inference backend. The Conductor only talks to
//! the backend through [`LlmBackend`], so tests can swap in a scripted mock
//! and the Ollama client stays an integration detail.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use super::descriptor::ModelDescriptor;

/// Token stream events from LLM backends
#[derive(Clone, Debug, PartialEq)]
pub enum StreamingToken {
    /// A fragment of the response
    Token(String),
    /// Response completed successfully
    Complete {
        /// Concatenation of every fragment sent before completion
        message: String,
    },
    /// Error occurred during streaming
    Error(String),
}

/// One role-tagged message for the backend chat endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    /// `user` or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

/// Configuration for LLM requests
#[derive(Clone, Debug, Default)]
pub struct LlmRequest {
    /// Flattened prompt (used by the generate endpoint)
    pub prompt: String,
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// Temperature override (backend default when `None`)
    pub temperature: Option<f32>,
    /// System prompt (optional)
    pub system: Option<String>,
    /// Role-tagged history; when set the chat endpoint is used instead
    pub messages: Option<Vec<WireMessage>>,
}

impl LlmRequest {
    /// Create a new request with prompt and model
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Create a structured chat request from role-tagged messages
    pub fn chat(messages: Vec<WireMessage>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Some(messages),
            ..Default::default()
        }
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Whether this request targets the chat endpoint
    #[must_use]
    pub fn is_chat(&self) -> bool {
        self.messages.is_some()
    }
}

/// LLM Backend trait
///
/// Implement this trait to add support for a different inference server.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Get the backend name (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Send a request and get a streaming response
    ///
    /// Returns a channel receiver that yields fragments in arrival order and
    /// closes once the backend signals completion or an error occurs.
    async fn send_streaming(
        &self,
        request: &LlmRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>>;

    /// List locally installed models
    async fn list_models(&self) -> anyhow::Result<Vec<ModelDescriptor>>;

    /// Download a model so later generations can use it
    async fn pull_model(&self, model: &str) -> anyhow::Result<()>;
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// URL scheme, `http` or `https`
    pub scheme: String,
    /// Ollama host address (IPv6 literals without brackets)
    pub host: String,
    /// Ollama port number
    pub port: u16,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl BackendConfig {
    /// Create Ollama configuration
    pub fn ollama(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Base URL of the backend HTTP API
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if host.contains(':') {
            format!("{}://[{}]:{}", self.scheme, host, self.port)
        } else {
            format!("{}://{}:{}", self.scheme, host, self.port)
        }
    }
}
