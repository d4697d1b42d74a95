//! Surface Events
//!
//! Events sent from the display surface to the Conductor. The surface only
//! reports what the user did; the Conductor decides what it means.

use serde::{Deserialize, Serialize};

use crate::messages::EventId;

/// Slash commands understood by the Conductor
pub const COMMANDS: &[&str] = &["help", "clear", "model", "models", "quit", "exit"];

/// Events from UI Surface to Conductor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Surface connected to Conductor (first render of the session)
    Connected {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Surface type identifier
        surface_type: SurfaceType,
    },

    /// User submitted a message
    UserMessage {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// The message content
        content: String,
    },

    /// User picked a model in the selection sidebar
    ModelSelected {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// The chosen model identifier
        model: String,
    },

    /// User executed a command (e.g., /help, /quit)
    UserCommand {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Command name (without leading /)
        command: String,
        /// Command arguments
        args: Vec<String>,
    },

    /// User requested quit
    QuitRequested {
        /// Event ID for acknowledgment
        event_id: EventId,
    },
}

impl SurfaceEvent {
    /// Generate a new event ID for this event
    pub fn new_event_id() -> EventId {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        EventId(format!("evt_{id}"))
    }

    /// Get the event ID of this event
    pub fn event_id(&self) -> &EventId {
        match self {
            Self::Connected { event_id, .. }
            | Self::UserMessage { event_id, .. }
            | Self::ModelSelected { event_id, .. }
            | Self::UserCommand { event_id, .. }
            | Self::QuitRequested { event_id } => event_id,
        }
    }

    /// Parse raw input text into a message or a slash command
    ///
    /// `/model llama3.2:latest` becomes a `UserCommand`. Only names in
    /// [`COMMANDS`] are commands; anything else, including text that merely
    /// starts with a slash like a file path, is a `UserMessage` carrying the
    /// text untouched.
    pub fn from_input(text: String) -> Self {
        let event_id = Self::new_event_id();
        if let Some(rest) = text.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            if let Some(command) = parts.next().filter(|c| COMMANDS.contains(c)) {
                return Self::UserCommand {
                    event_id,
                    command: command.to_string(),
                    args: parts.map(str::to_string).collect(),
                };
            }
        }
        Self::UserMessage {
            event_id,
            content: text,
        }
    }
}

/// Type of UI surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Terminal UI (ratatui/crossterm)
    Tui,
    /// Headless (for testing/automation)
    Headless,
}

impl SurfaceType {
    /// Human-readable name
    pub fn name(&self) -> &str {
        match self {
            Self::Tui => "Terminal",
            Self::Headless => "Headless",
        }
    }
}
