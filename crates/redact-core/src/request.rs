//! Request models

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Mode, RedactionType};

/// Caller-supplied description of where the text came from.
///
/// Consulted only for policy conditions and field scoping, never for detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// e.g. "chat", "document", "api"
    #[serde(default)]
    pub source: String,
    /// e.g. "messages.content"
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub user_role: String,
    /// e.g. ["GDPR", "HIPAA"]
    #[serde(default)]
    pub compliance_reqs: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl RequestContext {
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Default::default()
        }
    }
}

/// A pattern supplied with a single request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomPattern {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CustomPattern {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionRequest {
    pub text: String,
    /// Restrict detection to these types (empty = every active pattern)
    #[serde(default)]
    pub types: Vec<RedactionType>,
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,
    /// Unset means the tenant default, then `replace`
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub context: Option<RequestContext>,
    #[serde(default)]
    pub reversible: bool,
    /// Token lifetime; unset or zero means the engine default
    #[serde(default)]
    pub ttl: Option<Duration>,
}

impl RedactionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn reversible(mut self, ttl: Option<Duration>) -> Self {
        self.reversible = true;
        self.ttl = ttl;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_types(mut self, types: Vec<RedactionType>) -> Self {
        self.types = types;
        self
    }

    pub fn with_custom_pattern(mut self, pattern: CustomPattern) -> Self {
        self.custom_patterns.push(pattern);
        self
    }
}
