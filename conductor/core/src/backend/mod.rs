//! LLM Backend Integration
//!
//! Everything the Conductor needs from the local inference server, behind
//! the [`LlmBackend`] trait:
//!
//! - **traits**: request/streaming types and the backend trait
//! - **descriptor**: normalization of model listing entries
//! - **ollama**: HTTP client for the Ollama API
//! - **process**: checks for and launches the local server process
//!
//! # Usage
//!
//! ```ignore
//! use chat_conductor::backend::{BackendConfig, LlmBackend, LlmRequest, OllamaBackend};
//!
//! let backend = OllamaBackend::new(BackendConfig::default())?;
//! let request = LlmRequest::new("User: Hello!\nAssistant:", "llama3.2:latest");
//! let rx = backend.send_streaming(&request).await?;
//! ```

mod descriptor;
mod ollama;
mod process;
mod traits;

pub use descriptor::{extract_model_name, parse_listing, ModelDescriptor, ModelEntry};
pub use ollama::{parse_stream_line, NdjsonLines, OllamaBackend, StreamChunk};
pub use process::{
    BackendSupervisor, LaunchOutcome, ProcessControl, ProcessSettings, SystemProcesses,
};
pub use traits::{BackendConfig, LlmBackend, LlmRequest, StreamingToken, WireMessage};
