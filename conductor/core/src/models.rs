//! Allowed Models
//!
//! The fixed list of models a user may pick from, in display order, and the
//! one selected when a session starts.

use crate::config::ConfigError;
use crate::error::ChatError;

/// Models shipped as the default selection list
pub const DEFAULT_MODELS: &[&str] = &[
    "gemma3:12b",
    "deepseek-r1:8b",
    "llama3.2:latest",
    "llama3.1:latest",
    "mistral:latest",
];

/// Validated list of selectable models
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelCatalog {
    allowed: Vec<String>,
    default: String,
}

impl ModelCatalog {
    /// Build a catalog
    ///
    /// Entries and the default are trimmed and duplicates are dropped (first
    /// occurrence wins). Without an explicit default the first allowed model
    /// is used.
    ///
    /// # Errors
    ///
    /// Fails when the list is empty or the default is not in it.
    pub fn new(allowed: Vec<String>, default: Option<String>) -> Result<Self, ConfigError> {
        let mut unique: Vec<String> = Vec::with_capacity(allowed.len());
        for model in allowed {
            let model = model.trim().to_string();
            if !model.is_empty() && !unique.contains(&model) {
                unique.push(model);
            }
        }

        let Some(first) = unique.first().cloned() else {
            return Err(ConfigError::ValidationError(
                "models.allowed must list at least one model".to_string(),
            ));
        };

        let default = default
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let default = match default {
            Some(model) if unique.contains(&model) => model,
            Some(model) => {
                return Err(ConfigError::ValidationError(format!(
                    "default model '{model}' is not in models.allowed"
                )))
            }
            None => first,
        };

        Ok(Self {
            allowed: unique,
            default,
        })
    }

    /// Allowed models, in display order
    pub fn models(&self) -> &[String] {
        &self.allowed
    }

    /// Model selected when a session starts
    pub fn default_model(&self) -> &str {
        &self.default
    }

    /// Whether `model` may be selected
    pub fn contains(&self, model: &str) -> bool {
        self.allowed.iter().any(|m| m == model)
    }

    /// Display index of `model`
    pub fn position(&self, model: &str) -> Option<usize> {
        self.allowed.iter().position(|m| m == model)
    }

    /// Check a user selection against the list
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidModel`] for models outside the list.
    pub fn check(&self, model: &str) -> Result<(), ChatError> {
        if self.contains(model) {
            Ok(())
        } else {
            Err(ChatError::InvalidModel(model.to_string()))
        }
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        let allowed: Vec<String> = DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect();
        let default = allowed[0].clone();
        Self { allowed, default }
    }
}
