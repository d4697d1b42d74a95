//! Model Descriptors
//!
//! The model listing endpoint has returned several entry shapes across
//! server and client versions: records carrying a `model` field, mappings
//! keyed by `name`, bare strings and `[name, ...]` tuples. All of them are
//! classified once, here, into a closed [`ModelEntry`] and normalized into a
//! canonical [`ModelDescriptor`]. Nothing past this module sees raw entries.

use serde_json::{Map, Value};

/// A raw listing entry, classified by shape
#[derive(Clone, Debug, PartialEq)]
pub enum ModelEntry {
    /// Structured record exposing a textual `model` attribute
    Record {
        /// The `model` attribute
        model: String,
        /// Every other field of the record
        fields: Map<String, Value>,
    },
    /// Mapping without a textual `model` attribute (may carry `name`)
    Mapping(Map<String, Value>),
    /// Plain text
    Text(String),
    /// Ordered sequence, e.g. a `(name, digest)` pair
    Sequence(Vec<Value>),
    /// Anything else
    Opaque(Value),
}

impl ModelEntry {
    /// Classify a JSON value
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => match fields.remove("model") {
                Some(Value::String(model)) => Self::Record { model, fields },
                Some(other) => {
                    fields.insert("model".to_string(), other);
                    Self::Mapping(fields)
                }
                None => Self::Mapping(fields),
            },
            Value::String(text) => Self::Text(text),
            Value::Array(items) => Self::Sequence(items),
            other => Self::Opaque(other),
        }
    }

    /// Borrow the object fields, if this entry has any
    fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Record { fields, .. } | Self::Mapping(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Best-effort plain-text identifier for any listing entry
///
/// First match wins: `model` attribute, `name` key, the text itself, the
/// first element of a non-empty sequence, then a textual rendering of the
/// whole entry. Never fails.
#[must_use]
pub fn extract_model_name(entry: &ModelEntry) -> String {
    match entry {
        ModelEntry::Record { model, .. } => model.clone(),
        ModelEntry::Mapping(fields) => match fields.get("name") {
            Some(name) => value_text(name),
            None => Value::Object(fields.clone()).to_string(),
        },
        ModelEntry::Text(text) => text.clone(),
        ModelEntry::Sequence(items) => match items.first() {
            Some(first) => value_text(first),
            None => Value::Array(Vec::new()).to_string(),
        },
        ModelEntry::Opaque(value) => value.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Canonical description of an installed model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model identifier, e.g. `llama3.2:latest`
    pub name: String,
    /// Size on disk in bytes (if known)
    pub size: Option<u64>,
    /// Parameter count label, e.g. `3.2B` (if known)
    pub parameter_size: Option<String>,
}

impl ModelDescriptor {
    /// Descriptor carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            parameter_size: None,
        }
    }

    /// Normalize one raw listing entry
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        let entry = ModelEntry::from_json(value);
        let name = extract_model_name(&entry);
        let fields = entry.fields();
        let size = fields
            .and_then(|f| f.get("size"))
            .and_then(Value::as_u64);
        let parameter_size = fields
            .and_then(|f| f.get("details"))
            .and_then(|d| d.get("parameter_size"))
            .and_then(Value::as_str)
            .map(String::from);

        Self {
            name,
            size,
            parameter_size,
        }
    }
}

/// Normalize a whole listing response
///
/// Accepts `{"models": [...]}` as well as a bare array. Any other body
/// yields an empty listing.
#[must_use]
pub fn parse_listing(body: Value) -> Vec<ModelDescriptor> {
    let entries = match body {
        Value::Object(mut root) => match root.remove("models") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        Value::Array(entries) => entries,
        _ => Vec::new(),
    };

    entries.into_iter().map(ModelDescriptor::from_json).collect()
}
