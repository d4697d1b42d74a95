//! Session Management
//!
//! One conversation between the user and a local model.
//!
//! # Design Philosophy
//!
//! A session is an explicit value owned by the Conductor: it is created with
//! an empty history and the default model, handed to every turn, and dropped
//! when the process exits. There is no global lookup and no persistence.
//!
//! History is append-only while a turn runs. Each completed turn leaves an
//! assistant message at the end whose content is the full, trimmed response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::messages::{MessageId, MessageRole, SessionId};

/// A message in the conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Session metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session last changed
    pub last_active_at: DateTime<Utc>,
    /// Messages appended over the whole session (survives `/clear`)
    pub message_count: u32,
    /// Completed turns
    pub turn_count: u32,
}

impl SessionMetadata {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_active_at: now,
            message_count: 0,
            turn_count: 0,
        }
    }

    fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

/// A conversation session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,
    /// Session metadata
    pub metadata: SessionMetadata,
    /// Conversation history, in order
    messages: Vec<ConversationMessage>,
    /// Model targeted by the next turn
    selected_model: String,
}

impl Session {
    /// Create a session with empty history targeting `default_model`
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            metadata: SessionMetadata::new(),
            messages: Vec::new(),
            selected_model: default_model.into(),
        }
    }

    /// Append a user message
    pub fn add_user_message(&mut self, content: impl Into<String>) -> MessageId {
        self.push(ConversationMessage::new(MessageRole::User, content))
    }

    /// Append the assistant reply that completes a turn
    pub fn add_assistant_message(&mut self, content: impl Into<String>) -> MessageId {
        self.add_assistant_message_with_id(MessageId::new(), content)
    }

    /// Append the assistant reply under an ID already announced to the surface
    pub fn add_assistant_message_with_id(
        &mut self,
        id: MessageId,
        content: impl Into<String>,
    ) -> MessageId {
        let mut message = ConversationMessage::new(MessageRole::Assistant, content);
        message.id = id;
        let id = self.push(message);
        self.metadata.turn_count += 1;
        id
    }

    fn push(&mut self, message: ConversationMessage) -> MessageId {
        let id = message.id.clone();
        self.messages.push(message);
        self.metadata.message_count += 1;
        self.metadata.touch();
        id
    }

    /// Conversation history, in order
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Most recent message
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Whether no message has been appended since creation or the last clear
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages in the history
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Model targeted by the next turn
    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    /// Change the model selection
    ///
    /// Returns `false` when the model was already selected.
    pub fn select_model(&mut self, model: impl Into<String>) -> bool {
        let model = model.into();
        if model == self.selected_model {
            return false;
        }
        tracing::debug!(from = %self.selected_model, to = %model, "Model selection changed");
        self.selected_model = model;
        self.metadata.touch();
        true
    }

    /// Clear message history (keeps metadata and model selection)
    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.metadata.touch();
    }
}
