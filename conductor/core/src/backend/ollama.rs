//! Ollama Backend Implementation
//!
//! LLM backend for Ollama (local LLM server).
//!
//! # Ollama API
//!
//! - `/api/generate` - Completions from a flat prompt (streamed as NDJSON)
//! - `/api/chat` - Completions from role-tagged messages (streamed as NDJSON)
//! - `/api/tags` - List locally installed models
//! - `/api/pull` - Download a model (progress streamed as NDJSON)

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::descriptor::{parse_listing, ModelDescriptor};
use super::traits::{BackendConfig, LlmBackend, LlmRequest, StreamingToken};

/// Ollama backend client
#[derive(Clone)]
pub struct OllamaBackend {
    /// Connection settings
    config: BackendConfig,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// Only the connect phase is bounded; generation and pulls may run for as
    /// long as the server keeps the stream open.
    pub fn new(config: BackendConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Connection settings in use
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url())
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url())
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.config.base_url())
    }

    fn pull_url(&self) -> String {
        format!("{}/api/pull", self.config.base_url())
    }

    /// Build the JSON body for a streaming request
    fn request_body(request: &LlmRequest) -> serde_json::Value {
        let mut body = match request.messages {
            Some(ref messages) => serde_json::json!({
                "model": request.model,
                "messages": messages,
                "stream": true,
            }),
            None => serde_json::json!({
                "model": request.model,
                "prompt": request.prompt,
                "stream": true,
            }),
        };

        if let Some(ref system) = request.system {
            if request.is_chat() {
                if let Some(messages) = body["messages"].as_array_mut() {
                    messages.insert(
                        0,
                        serde_json::json!({"role": "system", "content": system}),
                    );
                }
            } else {
                body["system"] = serde_json::json!(system);
            }
        }

        let mut options = serde_json::Map::new();
        if let Some(temperature) = request.temperature {
            options.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        body
    }

    /// Fail on non-success HTTP status, keeping the server's error body
    async fn check_status(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Ollama returned {status}: {body}");
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn send_streaming(
        &self,
        request: &LlmRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let (tx, rx) = mpsc::channel(100);

        let url = if request.is_chat() {
            self.chat_url()
        } else {
            self.generate_url()
        };
        let body = Self::request_body(request);

        tracing::debug!(url = %url, model = %request.model, "Starting generation");

        let response = self.http_client.post(&url).json(&body).send().await?;
        let response = Self::check_status(response).await?;
        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut lines = NdjsonLines::default();
            let mut full_response = String::new();

            loop {
                let (batch, finished) = match stream.next().await {
                    Some(Ok(bytes)) => (lines.push(&bytes), false),
                    Some(Err(e)) => {
                        let _ = tx.send(StreamingToken::Error(e.to_string())).await;
                        return;
                    }
                    None => (lines.finish().into_iter().collect::<Vec<_>>(), true),
                };

                for line in batch {
                    let Some(chunk) = parse_stream_line(&line) else {
                        tracing::trace!(line = %line, "Skipping unparseable stream line");
                        continue;
                    };

                    if let Some(error) = chunk.error {
                        let _ = tx.send(StreamingToken::Error(error)).await;
                        return;
                    }

                    if chunk.done {
                        let _ = tx
                            .send(StreamingToken::Complete {
                                message: full_response,
                            })
                            .await;
                        return;
                    }

                    if let Some(text) = chunk.text {
                        full_response.push_str(&text);
                        if tx.send(StreamingToken::Token(text)).await.is_err() {
                            // Receiver dropped, stop streaming
                            return;
                        }
                    }
                }

                if finished {
                    break;
                }
            }

            // Stream ended without done signal
            tracing::debug!("Generation stream closed without done flag");
            let _ = tx
                .send(StreamingToken::Complete {
                    message: full_response,
                })
                .await;
        });

        Ok(rx)
    }

    async fn list_models(&self) -> anyhow::Result<Vec<ModelDescriptor>> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let data: serde_json::Value = response.json().await?;
        let models = parse_listing(data);

        tracing::debug!(count = models.len(), "Listed local models");
        Ok(models)
    }

    async fn pull_model(&self, model: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "model": model,
            "stream": true,
        });

        let response = self
            .http_client
            .post(self.pull_url())
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let mut stream = response.bytes_stream();
        let mut lines = NdjsonLines::default();

        loop {
            let batch = match stream.next().await {
                Some(chunk) => lines.push(&chunk?),
                None => {
                    let rest: Vec<String> = lines.finish().into_iter().collect();
                    for line in &rest {
                        check_pull_line(model, line)?;
                    }
                    break;
                }
            };
            for line in &batch {
                check_pull_line(model, line)?;
            }
        }

        Ok(())
    }
}

/// Inspect one pull progress line, failing on a reported error
fn check_pull_line(model: &str, line: &str) -> anyhow::Result<()> {
    let Ok(data) = serde_json::from_str::<serde_json::Value>(line) else {
        return Ok(());
    };
    if let Some(error) = data.get("error").and_then(|e| e.as_str()) {
        anyhow::bail!("{error}");
    }
    if let Some(status) = data.get("status").and_then(|s| s.as_str()) {
        tracing::debug!(model = %model, status = %status, "Pull progress");
    }
    Ok(())
}

/// One parsed line of a generate or chat stream
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamChunk {
    /// Fragment text (`response` for generate, `message.content` for chat)
    pub text: Option<String>,
    /// Whether the backend signalled completion
    pub done: bool,
    /// Error reported in-band by the backend
    pub error: Option<String>,
}

/// Parse one NDJSON line from `/api/generate` or `/api/chat`
///
/// Returns `None` for blank or malformed lines.
#[must_use]
pub fn parse_stream_line(line: &str) -> Option<StreamChunk> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let data: serde_json::Value = serde_json::from_str(line).ok()?;

    let text = data
        .get("response")
        .and_then(|r| r.as_str())
        .or_else(|| {
            data.get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
        })
        .map(String::from);
    let done = data
        .get("done")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    let error = data
        .get("error")
        .and_then(|e| e.as_str())
        .map(String::from);

    Some(StreamChunk { text, done, error })
}

/// Splits a byte stream into newline-delimited lines
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct NdjsonLines {
    buffer: Vec<u8>,
}

impl NdjsonLines {
    /// Feed a chunk; returns every line it completed
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            if !text.trim().is_empty() {
                lines.push(text.into_owned());
            }
        }
        lines
    }

    /// Flush the trailing line that had no newline terminator
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            None
        } else {
            Some(text.into_owned())
        }
    }
}
