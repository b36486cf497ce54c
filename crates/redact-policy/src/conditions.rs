//! Condition interpreter over the request context

use redact_core::{ConditionOperator, PolicyCondition, RequestContext};
use regex::Regex;
use serde_json::Value;

/// A condition with its regex compiled once
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    pub condition: PolicyCondition,
    regex: Option<Regex>,
}

impl CompiledCondition {
    /// Compile the condition. A `regex` condition whose pattern fails to compile is kept
    /// but never matches; the error is returned alongside for reporting.
    pub fn compile(condition: PolicyCondition) -> (Self, Option<regex::Error>) {
        let mut error = None;
        let regex = match (&condition.operator, &condition.value) {
            (ConditionOperator::Regex, Value::String(pattern)) => match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    error = Some(e);
                    None
                }
            },
            _ => None,
        };

        (Self { condition, regex }, error)
    }

    pub fn matches(&self, context: Option<&RequestContext>, user_id: Option<&str>) -> bool {
        let Some(context) = context else {
            return false;
        };
        let Some(actual) = field_value(context, user_id, &self.condition.field) else {
            return false;
        };
        let expected = &self.condition.value;

        match self.condition.operator {
            ConditionOperator::Eq => values_equal(&actual, expected),
            ConditionOperator::Ne => !values_equal(&actual, expected),
            ConditionOperator::Contains => match (&actual, expected) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
                _ => false,
            },
            ConditionOperator::Regex => match (&self.regex, &actual) {
                (Some(regex), Value::String(s)) => regex.is_match(s),
                (Some(regex), Value::Array(items)) => {
                    items.iter().any(|item| item.as_str().is_some_and(|s| regex.is_match(s)))
                }
                _ => false,
            },
            ConditionOperator::In => match (expected, &actual) {
                (Value::Array(options), Value::Array(items)) => items
                    .iter()
                    .any(|item| options.iter().any(|option| values_equal(item, option))),
                (Value::Array(options), actual) => options.iter().any(|option| values_equal(actual, option)),
                _ => false,
            },
            ConditionOperator::Unknown => false,
        }
    }
}

/// AND over all conditions; an empty list passes
pub fn evaluate(conditions: &[CompiledCondition], context: Option<&RequestContext>, user_id: Option<&str>) -> bool {
    conditions.iter().all(|c| c.matches(context, user_id))
}

/// Resolve a condition field. Empty built-in strings count as absent.
pub fn field_value(context: &RequestContext, user_id: Option<&str>, field: &str) -> Option<Value> {
    let text = |s: &str| (!s.is_empty()).then(|| Value::String(s.to_string()));

    match field {
        "source" => text(&context.source),
        "field" => text(&context.field),
        "content_type" => text(&context.content_type),
        "language" => text(&context.language),
        "user_role" => text(&context.user_role),
        "compliance_reqs" => Some(Value::Array(
            context
                .compliance_reqs
                .iter()
                .map(|r| Value::String(r.clone()))
                .collect(),
        )),
        "user_id" => user_id.and_then(text),
        other => context.metadata.get(other).cloned(),
    }
}

// Strings compare exactly; numbers compare by value so 5 == 5.0
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> RequestContext {
        let mut context = RequestContext::for_field("messages.content");
        context.source = "chat".into();
        context.user_role = "analyst".into();
        context.compliance_reqs = vec!["GDPR".into(), "HIPAA".into()];
        context.metadata.insert("region".into(), json!("eu-west"));
        context.metadata.insert("tier".into(), json!(3));
        context
    }

    fn check(field: &str, operator: ConditionOperator, value: Value) -> bool {
        let (condition, error) = CompiledCondition::compile(PolicyCondition::new(field, operator, value));
        assert!(error.is_none());
        condition.matches(Some(&context()), Some("user-7"))
    }

    #[test]
    fn test_equality() {
        assert!(check("source", ConditionOperator::Eq, json!("chat")));
        assert!(!check("source", ConditionOperator::Eq, json!("document")));
        assert!(check("source", ConditionOperator::Ne, json!("document")));
        assert!(check("user_id", ConditionOperator::Eq, json!("user-7")));
        assert!(check("tier", ConditionOperator::Eq, json!(3.0)));
    }

    #[test]
    fn test_contains() {
        assert!(check("compliance_reqs", ConditionOperator::Contains, json!("HIPAA")));
        assert!(!check("compliance_reqs", ConditionOperator::Contains, json!("PCI")));
        assert!(check("region", ConditionOperator::Contains, json!("eu")));
    }

    #[test]
    fn test_regex_and_in() {
        assert!(check("user_role", ConditionOperator::Regex, json!("^ana")));
        assert!(check("compliance_reqs", ConditionOperator::Regex, json!("^HIP")));
        assert!(check("user_role", ConditionOperator::In, json!(["admin", "analyst"])));
        assert!(!check("user_role", ConditionOperator::In, json!(["admin"])));
        assert!(check("compliance_reqs", ConditionOperator::In, json!(["PCI", "GDPR"])));
    }

    #[test]
    fn test_missing_field_never_matches() {
        assert!(!check("department", ConditionOperator::Eq, json!("x")));
        assert!(!check("department", ConditionOperator::Ne, json!("x")));
        // language is empty in the context
        assert!(!check("language", ConditionOperator::Ne, json!("en")));
    }

    #[test]
    fn test_unknown_operator_never_matches() {
        assert!(!check("source", ConditionOperator::Unknown, json!("chat")));
    }

    #[test]
    fn test_no_context_never_matches() {
        let (condition, _) =
            CompiledCondition::compile(PolicyCondition::new("source", ConditionOperator::Eq, json!("chat")));
        assert!(!condition.matches(None, None));
    }

    #[test]
    fn test_invalid_regex_reported_and_inert() {
        let (condition, error) =
            CompiledCondition::compile(PolicyCondition::new("source", ConditionOperator::Regex, json!("[oops")));
        assert!(error.is_some());
        assert!(!condition.matches(Some(&context()), None));
    }

    #[test]
    fn test_and_semantics() {
        let compile = |field: &str, value: Value| {
            CompiledCondition::compile(PolicyCondition::new(field, ConditionOperator::Eq, value)).0
        };
        let both = vec![compile("source", json!("chat")), compile("user_role", json!("analyst"))];
        assert!(evaluate(&both, Some(&context()), None));

        let mixed = vec![compile("source", json!("chat")), compile("user_role", json!("admin"))];
        assert!(!evaluate(&mixed, Some(&context()), None));

        assert!(evaluate(&[], None, None));
    }
}
