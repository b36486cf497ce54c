//! Policy models

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{CustomPattern, Mode, RedactionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[serde(alias = "equals")]
    Eq,
    #[serde(alias = "not_equals")]
    Ne,
    /// Substring for string fields, membership for list fields
    Contains,
    Regex,
    /// Field value is one of the listed values
    In,
    /// Anything else; never matches
    #[serde(other)]
    Unknown,
}

/// `field <operator> value` predicate over the request context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCondition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: serde_json::Value,
}

impl PolicyCondition {
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    pub patterns: Vec<String>,
    pub fields: Vec<String>,
    pub mode: Mode,
    /// AND-combined; empty always passes
    #[serde(default)]
    pub conditions: Vec<PolicyCondition>,
    /// Informational; does not take part in conflict resolution
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl PolicyRule {
    pub fn new(name: impl Into<String>, mode: Mode) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
            fields: Vec::new(),
            mode,
            conditions: Vec::new(),
            priority: 0,
            enabled: true,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn with_condition(mut self, condition: PolicyCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// Redaction request carrying caller-supplied policy rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyRequest {
    #[serde(flatten)]
    pub request: RedactionRequest,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl PolicyRequest {
    pub fn new(request: RedactionRequest, rules: Vec<PolicyRule>) -> Self {
        Self {
            request,
            rules,
            user_id: None,
        }
    }
}

/// One problem found while validating a rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub code: String,
}

impl ValidationError {
    pub fn new(rule: &str, field: Option<String>, message: impl Into<String>, code: &str) -> Self {
        Self {
            rule: rule.to_string(),
            field,
            message: message.into(),
            code: code.to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] rule '{}' {}: {}", self.code, self.rule, field, self.message),
            None => write!(f, "[{}] rule '{}': {}", self.code, self.rule, self.message),
        }
    }
}

/// Rule set and defaults stored per tenant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantPolicy {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,
    #[serde(default)]
    pub default_mode: Option<Mode>,
    #[serde(default)]
    pub compliance_reqs: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}
