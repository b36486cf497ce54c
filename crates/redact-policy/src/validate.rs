//! Rule validation; every problem is collected, nothing short-circuits

use redact_core::{ConditionOperator, PolicyRule, ValidationError};
use regex::Regex;
use serde_json::Value;

pub const EMPTY_RULE_NAME: &str = "EMPTY_RULE_NAME";
pub const NO_PATTERNS: &str = "NO_PATTERNS";
pub const EMPTY_PATTERN: &str = "EMPTY_PATTERN";
pub const INVALID_REGEX: &str = "INVALID_REGEX";
pub const MISSING_FIELDS: &str = "MISSING_FIELDS";
pub const INVALID_PRIORITY: &str = "INVALID_PRIORITY";
pub const INVALID_MODE: &str = "INVALID_MODE";
pub const MISSING_CONDITION_FIELD: &str = "MISSING_CONDITION_FIELD";
pub const UNKNOWN_OPERATOR: &str = "UNKNOWN_OPERATOR";
pub const INVALID_CONDITION_VALUE: &str = "INVALID_CONDITION_VALUE";

pub fn validate(rules: &[PolicyRule]) -> Vec<ValidationError> {
    rules.iter().flat_map(validate_rule).collect()
}

pub fn validate_rule(rule: &PolicyRule) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let name = rule.name.as_str();

    if name.trim().is_empty() {
        errors.push(ValidationError::new(
            name,
            Some("name".into()),
            "rule name cannot be empty",
            EMPTY_RULE_NAME,
        ));
    }

    if rule.patterns.is_empty() {
        errors.push(ValidationError::new(
            name,
            Some("patterns".into()),
            "at least one pattern is required",
            NO_PATTERNS,
        ));
    }

    for (i, pattern) in rule.patterns.iter().enumerate() {
        let field = Some(format!("patterns[{}]", i));
        if pattern.is_empty() {
            errors.push(ValidationError::new(name, field, "pattern cannot be empty", EMPTY_PATTERN));
        } else if let Err(e) = Regex::new(pattern) {
            errors.push(ValidationError::new(
                name,
                field,
                format!("invalid regex pattern: {}", e),
                INVALID_REGEX,
            ));
        }
    }

    if rule.fields.is_empty() {
        errors.push(ValidationError::new(
            name,
            Some("fields".into()),
            "at least one field is required",
            MISSING_FIELDS,
        ));
    }

    if rule.priority < 0 {
        errors.push(ValidationError::new(
            name,
            Some("priority".into()),
            format!("priority must be non-negative, got {}", rule.priority),
            INVALID_PRIORITY,
        ));
    }

    if !rule.mode.is_supported() {
        errors.push(ValidationError::new(
            name,
            Some("mode".into()),
            format!("unsupported redaction mode: {}", rule.mode),
            INVALID_MODE,
        ));
    }

    for (i, condition) in rule.conditions.iter().enumerate() {
        if condition.field.trim().is_empty() {
            errors.push(ValidationError::new(
                name,
                Some(format!("conditions[{}].field", i)),
                "condition field cannot be empty",
                MISSING_CONDITION_FIELD,
            ));
        }

        let value_field = Some(format!("conditions[{}].value", i));
        match (&condition.operator, &condition.value) {
            (ConditionOperator::Unknown, _) => errors.push(ValidationError::new(
                name,
                Some(format!("conditions[{}].operator", i)),
                "unknown condition operator",
                UNKNOWN_OPERATOR,
            )),
            (ConditionOperator::Regex, Value::String(pattern)) => {
                if let Err(e) = Regex::new(pattern) {
                    errors.push(ValidationError::new(
                        name,
                        value_field,
                        format!("invalid regex pattern: {}", e),
                        INVALID_REGEX,
                    ));
                }
            }
            (ConditionOperator::Regex, _) => errors.push(ValidationError::new(
                name,
                value_field,
                "regex condition needs a string value",
                INVALID_CONDITION_VALUE,
            )),
            (ConditionOperator::In, Value::Array(_)) => {}
            (ConditionOperator::In, _) => errors.push(ValidationError::new(
                name,
                value_field,
                "in condition needs a list value",
                INVALID_CONDITION_VALUE,
            )),
            _ => {}
        }
    }

    errors
}
