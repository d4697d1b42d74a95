//! Chat Conductor - Headless Orchestration for a Local Ollama Chat
//!
//! This crate holds all behavior of the chat interface, independent of any
//! UI framework. A terminal surface drives it today; tests drive it
//! headless.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      UI Surface (TUI)                        │
//! └───────────────────────────┬──────────────────────────────────┘
//!                             │
//!                     SurfaceEvent (up)
//!                   ConductorMessage (down)
//!                             │
//! ┌───────────────────────────┼──────────────────────────────────┐
//! │                     CONDUCTOR CORE                           │
//! │  ┌────────────────────────┴───────────────────────────────┐  │
//! │  │                      Conductor                         │  │
//! │  │  ┌─────────┐  ┌────────┐  ┌───────────┐  ┌──────────┐  │  │
//! │  │  │ Session │  │ Prompt │  │ Streaming │  │ Backend  │  │  │
//! │  │  │         │  │Builder │  │           │  │ (Ollama) │  │  │
//! │  │  └─────────┘  └────────┘  └───────────┘  └──────────┘  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: Owns the session and runs each turn
//! - [`ConductorMessage`]: Messages sent from Conductor to the surface
//! - [`SurfaceEvent`]: Events sent from the surface to Conductor
//! - [`Session`]: Conversation history and model selection
//! - [`ChatConfig`]: Layered configuration (file, environment, CLI)
//!
//! # Quick Start
//!
//! ```ignore
//! use chat_conductor::{
//!     backend::OllamaBackend, load_config, Conductor, SurfaceEvent, SurfaceType,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let backend = OllamaBackend::new(config.backend.clone())?;
//!
//!     let (tx, mut rx) = mpsc::channel(256);
//!     let (events_tx, events_rx) = mpsc::channel(32);
//!     let mut conductor = Conductor::new(backend, config.conductor_config()?, tx);
//!     tokio::spawn(async move { conductor.run(events_rx).await });
//!
//!     events_tx
//!         .send(SurfaceEvent::Connected {
//!             event_id: SurfaceEvent::new_event_id(),
//!             surface_type: SurfaceType::Headless,
//!         })
//!         .await?;
//!     events_tx.send(SurfaceEvent::from_input("Hello".into())).await?;
//!
//!     while let Some(msg) = rx.recv().await {
//!         // Render message
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Ollama client, model listing normalization, server process check
//! - [`conductor`]: Main Conductor struct
//! - [`config`]: TOML/environment/CLI configuration
//! - [`error`]: Chat error taxonomy
//! - [`events`]: Events from UI surfaces to Conductor
//! - [`messages`]: Messages from Conductor to UI surfaces
//! - [`models`]: Allowed model list
//! - [`prompt`]: Prompt construction from history
//! - [`session`]: Conversation session
//! - [`streaming`]: Fragment relay and accumulation
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod conductor;
pub mod config;
pub mod error;
pub mod events;
pub mod messages;
pub mod models;
pub mod prompt;
pub mod session;
pub mod streaming;

// Re-exports for convenience
pub use backend::{
    extract_model_name, BackendConfig, BackendSupervisor, LaunchOutcome, LlmBackend, LlmRequest,
    ModelDescriptor, ModelEntry, OllamaBackend, ProcessControl, ProcessSettings, StreamingToken,
    SystemProcesses, WireMessage,
};
pub use conductor::{Conductor, ConductorConfig};
pub use error::ChatError;
pub use events::{SurfaceEvent, SurfaceType};
pub use messages::{
    ConductorMessage, ConductorState, EventId, MessageId, MessageRole, NotifyLevel, SessionId,
};
pub use models::{ModelCatalog, DEFAULT_MODELS};
pub use prompt::{build_prompt, to_chat_messages, PromptMode};
pub use session::{ConversationMessage, Session, SessionMetadata};
pub use streaming::{stream_response, ChannelSink, FragmentSink};

// Config exports
pub use config::{
    default_config_path, default_log_path, load_config, load_config_from_path,
    load_config_with_env, ChatConfig, ChatConfigToml, ConfigError, ConfigOverrides, ConfigSource,
};
