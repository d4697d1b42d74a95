//! Conductor Messages
//!
//! Messages sent from the Conductor to the display surface. These are the only
//! way the orchestration layer talks to a UI: the surface renders what it is
//! told and keeps no conversation logic of its own.

use serde::{Deserialize, Serialize};

/// Messages from Conductor to UI Surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConductorMessage {
    // ============================================
    // Conversation Messages
    // ============================================
    /// A complete message block to display
    Message {
        /// Unique message ID for tracking
        id: MessageId,
        /// Who sent this message
        role: MessageRole,
        /// The message content
        content: String,
    },

    /// An assistant block is about to receive streamed fragments
    StreamStart {
        /// Message ID the following tokens belong to
        message_id: MessageId,
        /// Model producing the response
        model: String,
    },

    /// A streaming fragment (partial response)
    Token {
        /// Message ID this fragment belongs to
        message_id: MessageId,
        /// The fragment text
        text: String,
    },

    /// Stream has completed
    StreamEnd {
        /// Message ID that completed
        message_id: MessageId,
        /// Trimmed concatenation of every fragment
        final_content: String,
    },

    /// Stream encountered an error
    StreamError {
        /// Message ID that errored
        message_id: MessageId,
        /// Error description
        error: String,
    },

    /// The conversation history was emptied
    HistoryCleared,

    // ============================================
    // Model Selection
    // ============================================
    /// The active model changed
    ModelSelected {
        /// The newly selected model
        model: String,
    },

    // ============================================
    // System Messages
    // ============================================
    /// One-shot notice for the user
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Conductor state change
    State {
        /// The new state
        state: ConductorState,
    },

    /// Acknowledgment of received event
    Ack {
        /// Event ID being acknowledged
        event_id: EventId,
    },

    /// Session information, sent when a surface connects
    SessionInfo {
        /// Session ID
        session_id: SessionId,
        /// Page title for the surface
        title: String,
        /// Currently selected model
        model: String,
        /// Models the user may choose from, in display order
        available_models: Vec<String>,
    },

    /// Request surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Event identifier (for acks)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    pub fn new() -> Self {
        Self(format!("session_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Model reply
    Assistant,
}

impl MessageRole {
    /// Label used when flattening the conversation into a prompt
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }

    /// Role name understood by the backend chat endpoint
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// Conductor operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorState {
    /// Starting up, backend not yet checked
    Initializing,
    /// Downloading the selected model
    PullingModel,
    /// Ready for the next user message
    AwaitingInput,
    /// A turn is in flight; further input is refused
    ProcessingTurn,
    /// Shutting down
    ShuttingDown,
}

impl ConductorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up...",
            Self::PullingModel => "Pulling model...",
            Self::AwaitingInput => "Ready",
            Self::ProcessingTurn => "Thinking...",
            Self::ShuttingDown => "Shutting down...",
        }
    }

    /// Whether the surface may submit a new message
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::AwaitingInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_unique() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
        assert!(id1.0.starts_with("session_"));
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(MessageRole::User.label(), "User");
        assert_eq!(MessageRole::Assistant.label(), "Assistant");
        assert_eq!(MessageRole::Assistant.wire_name(), "assistant");
    }

    #[test]
    fn test_conductor_state_description() {
        assert_eq!(ConductorState::AwaitingInput.description(), "Ready");
        assert_eq!(ConductorState::ProcessingTurn.description(), "Thinking...");
        assert!(ConductorState::AwaitingInput.accepts_input());
        assert!(!ConductorState::ProcessingTurn.accepts_input());
        assert!(!ConductorState::PullingModel.accepts_input());
    }
}
