//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from ConductorMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the Conductor tells it to.
//! Display state is the bridge between ConductorMessages and rendering.
//!
//! - DisplayMessage: A rendered conversation block
//! - DisplayNotification: A one-shot notice shown above the input

use chat_conductor::{ConductorMessage, ConductorState, MessageId, MessageRole, NotifyLevel};

/// Notices kept on screen at once
pub const MAX_NOTIFICATIONS: usize = 3;

/// A rendered conversation message
#[derive(Clone, Debug)]
pub struct DisplayMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: DisplayRole,
    /// The message content
    pub content: String,
    /// Whether this message is still being streamed
    pub streaming: bool,
    /// Why streaming stopped early, if it did
    pub error: Option<String>,
}

impl DisplayMessage {
    /// Create a new display message
    pub fn new(id: MessageId, role: MessageRole, content: String) -> Self {
        Self {
            id,
            role: role.into(),
            content,
            streaming: false,
            error: None,
        }
    }

    /// Create a streaming message (content will be appended)
    pub fn streaming(id: MessageId) -> Self {
        Self {
            id,
            role: DisplayRole::Assistant,
            content: String::new(),
            streaming: true,
            error: None,
        }
    }

    /// Append a fragment to a streaming message
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Mark stream as complete
    pub fn complete(&mut self, final_content: String) {
        self.content = final_content;
        self.streaming = false;
    }

    /// Mark stream as failed, keeping whatever arrived
    pub fn fail(&mut self, error: String) {
        self.content = self.content.trim().to_string();
        self.streaming = false;
        self.error = Some(error);
    }
}

/// Display role for messages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// User input
    User,
    /// Model reply
    Assistant,
}

impl From<MessageRole> for DisplayRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => DisplayRole::User,
            MessageRole::Assistant => DisplayRole::Assistant,
        }
    }
}

impl DisplayRole {
    /// Label shown in the block border
    pub fn label(&self) -> &'static str {
        match self {
            DisplayRole::User => "You",
            DisplayRole::Assistant => "Assistant",
        }
    }
}

/// A notification to display
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Message content
    pub message: String,
}

/// The full display state for the TUI
#[derive(Debug)]
pub struct DisplayState {
    /// Conversation messages
    pub messages: Vec<DisplayMessage>,
    /// Current streaming message (if any)
    pub streaming_id: Option<MessageId>,
    /// Model producing the current stream
    pub streaming_model: Option<String>,
    /// Conductor state
    pub conductor_state: ConductorState,
    /// Title bar text
    pub title: String,
    /// Currently selected model
    pub session_model: String,
    /// Models offered in the sidebar
    pub available_models: Vec<String>,
    /// Whether session info has arrived
    pub ready: bool,
    /// Recent notices, oldest first
    pub notifications: Vec<DisplayNotification>,
    /// Set once the Conductor asks the surface to quit
    pub quit_requested: bool,
    /// Goodbye text from the Conductor
    pub quit_message: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            streaming_id: None,
            streaming_model: None,
            conductor_state: ConductorState::Initializing,
            title: chat_conductor::config::DEFAULT_TITLE.to_string(),
            session_model: String::new(),
            available_models: Vec::new(),
            ready: false,
            notifications: Vec::new(),
            quit_requested: false,
            quit_message: None,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ConductorMessage to update display state
    pub fn apply_message(&mut self, msg: ConductorMessage) {
        match msg {
            // Conversation messages
            ConductorMessage::Message { id, role, content } => {
                self.messages.push(DisplayMessage::new(id, role, content));
            }
            ConductorMessage::StreamStart { message_id, model } => {
                self.messages
                    .push(DisplayMessage::streaming(message_id.clone()));
                self.streaming_id = Some(message_id);
                self.streaming_model = Some(model);
            }
            ConductorMessage::Token { message_id, text } => {
                // Tokens without a StreamStart still get a block
                if self.streaming_id.as_ref() != Some(&message_id) {
                    self.messages
                        .push(DisplayMessage::streaming(message_id.clone()));
                    self.streaming_id = Some(message_id.clone());
                }
                if let Some(msg) = self.find_mut(&message_id) {
                    msg.append(&text);
                }
            }
            ConductorMessage::StreamEnd {
                message_id,
                final_content,
            } => {
                if let Some(msg) = self.find_mut(&message_id) {
                    msg.complete(final_content);
                }
                self.end_stream();
            }
            ConductorMessage::StreamError { message_id, error } => {
                if let Some(msg) = self.find_mut(&message_id) {
                    msg.fail(error);
                }
                self.end_stream();
            }
            ConductorMessage::HistoryCleared => {
                self.messages.clear();
                self.end_stream();
            }

            // Model selection
            ConductorMessage::ModelSelected { model } => {
                self.session_model = model;
            }

            // System messages
            ConductorMessage::Notify { level, message } => {
                self.notifications
                    .push(DisplayNotification { level, message });
                if self.notifications.len() > MAX_NOTIFICATIONS {
                    self.notifications.remove(0);
                }
            }
            ConductorMessage::State { state } => {
                self.conductor_state = state;
            }
            ConductorMessage::SessionInfo {
                title,
                model,
                available_models,
                ..
            } => {
                self.title = title;
                self.session_model = model;
                self.available_models = available_models;
                self.ready = true;
            }
            ConductorMessage::Quit { message } => {
                self.quit_requested = true;
                self.quit_message = message;
            }
            ConductorMessage::Ack { .. } => {}
        }
    }

    fn find_mut(&mut self, id: &MessageId) -> Option<&mut DisplayMessage> {
        self.messages.iter_mut().rev().find(|m| &m.id == id)
    }

    fn end_stream(&mut self) {
        self.streaming_id = None;
        self.streaming_model = None;
    }

    /// Drop every notice (they are one-shot)
    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    /// Check if currently streaming
    pub fn is_streaming(&self) -> bool {
        self.streaming_id.is_some()
    }

    /// Whether a new message may be submitted
    pub fn accepts_input(&self) -> bool {
        self.conductor_state.accepts_input()
    }

    /// Status bar text for the current state
    pub fn status_text(&self) -> String {
        match (&self.conductor_state, &self.streaming_model) {
            (ConductorState::ProcessingTurn, Some(model)) => format!("Thinking... ({model})"),
            (state, _) => state.description().to_string(),
        }
    }
}
