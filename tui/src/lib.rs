//! Ollama Chat TUI - Terminal interface for a local Ollama server
//!
//! Full-screen chat surface for the headless Conductor in `chat-conductor`.
//!
//! # Architecture
//!
//! - **App**: Render loop, key handling, layout
//! - **ConductorClient**: Channels to the Conductor task
//! - **Display**: State derived from ConductorMessages
//! - **Widgets**: Scrollable column of bordered message blocks
//! - **Logging**: File-backed tracing subscriber

pub mod app;
pub mod conductor_client;
pub mod display;
pub mod logging;
pub mod theme;
pub mod widgets;

pub use app::{App, Focus};
pub use conductor_client::ConductorClient;
