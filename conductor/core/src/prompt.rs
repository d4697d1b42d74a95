//! Prompt Construction
//!
//! Turns session history into what the backend consumes.
//!
//! [`build_prompt`] produces the flat transcript used with the generate
//! endpoint: one `Label: content` line per message, then an empty
//! `Assistant:` line for the model to continue. Content is not escaped, so a
//! message that itself contains `User:` or `Assistant:` blurs the role
//! boundaries. [`to_chat_messages`] is the structured alternative for the
//! chat endpoint, where roles travel as data.

use serde::{Deserialize, Serialize};

use crate::backend::WireMessage;
use crate::session::ConversationMessage;

/// How history is handed to the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Flat transcript sent to the generate endpoint
    #[default]
    Flat,
    /// Role-tagged messages sent to the chat endpoint
    Structured,
}

impl std::str::FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "structured" | "chat" => Ok(Self::Structured),
            other => Err(format!(
                "unknown prompt mode '{other}' (expected 'flat' or 'structured')"
            )),
        }
    }
}

impl std::fmt::Display for PromptMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => f.write_str("flat"),
            Self::Structured => f.write_str("structured"),
        }
    }
}

/// Flatten the conversation into a single prompt
#[must_use]
pub fn build_prompt(messages: &[ConversationMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str(message.role.label());
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str("Assistant:");
    prompt
}

/// Role-tagged copy of the conversation for the chat endpoint
#[must_use]
pub fn to_chat_messages(messages: &[ConversationMessage]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|m| WireMessage {
            role: m.role.wire_name().to_string(),
            content: m.content.clone(),
        })
        .collect()
}
