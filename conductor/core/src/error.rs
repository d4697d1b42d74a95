//! Chat Error Taxonomy
//!
//! Every failure the Conductor can hit while running a session. None of these
//! propagate out of a turn: the Conductor logs them and turns them into a
//! one-shot notice for the surface.

use thiserror::Error;

/// Errors raised while driving a chat session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The local backend process is not running and could not be started
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Listing locally installed models failed
    #[error("Error listing locally available models: {0}")]
    ModelListing(String),

    /// Downloading a model failed
    #[error("Error pulling model '{model}': {reason}")]
    ModelPull {
        /// Model that was being pulled
        model: String,
        /// What went wrong
        reason: String,
    },

    /// Generation failed before or during streaming
    #[error("Generation failed: {reason}")]
    Generation {
        /// What went wrong
        reason: String,
        /// Text received before the failure (may be empty)
        partial: String,
    },

    /// The requested model is not in the allowed list
    #[error("Model '{0}' is not in the allowed model list")]
    InvalidModel(String),
}

impl ChatError {
    /// Build a generation error from any displayable cause
    pub fn generation(reason: impl std::fmt::Display) -> Self {
        Self::Generation {
            reason: reason.to_string(),
            partial: String::new(),
        }
    }
}
