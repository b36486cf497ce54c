//! Policy evaluation: conditions, field scoping, rule patterns

use redact_core::{PolicyRule, Redaction, RedactionType, RequestContext};
use redact_detect::{Detector, PatternSpec};
use tracing::{debug, warn};

use crate::conditions::{CompiledCondition, evaluate};

/// Confidence assigned to rule pattern matches
pub const RULE_CONFIDENCE: f64 = 0.90;

/// A rule with its patterns and conditions compiled. Invalid patterns are dropped.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: PolicyRule,
    patterns: Vec<PatternSpec>,
    conditions: Vec<CompiledCondition>,
}

impl CompiledRule {
    pub fn patterns(&self) -> &[PatternSpec] {
        &self.patterns
    }

    /// Conditions pass and at least one declared field covers the request's field.
    /// A request without a content field is not scoped.
    pub fn applies(&self, context: Option<&RequestContext>, user_id: Option<&str>) -> bool {
        if !self.rule.enabled {
            return false;
        }
        if !evaluate(&self.conditions, context, user_id) {
            return false;
        }
        match context {
            // Nothing to scope against
            None => true,
            Some(context) if context.field.is_empty() => true,
            Some(context) => self
                .rule
                .fields
                .iter()
                .any(|declared| field_matches(declared, &context.field)),
        }
    }
}

/// Whether a rule's declared field covers the content field of the request.
///
/// `messages`, `messages.content` and `content` all cover message content;
/// `metadata` covers metadata; anything else must match exactly.
pub fn field_matches(declared: &str, request_field: &str) -> bool {
    match declared {
        "messages" | "messages.content" | "content" => {
            matches!(request_field, "messages.content" | "content")
        }
        "metadata" => request_field == "metadata",
        other => other == request_field,
    }
}

/// Rule set compiled once and reused across requests
#[derive(Debug, Clone, Default)]
pub struct CompiledPolicy {
    rules: Vec<CompiledRule>,
    /// Non-fatal problems found while compiling
    pub warnings: Vec<String>,
}

impl CompiledPolicy {
    pub fn compile(rules: &[PolicyRule]) -> Self {
        let mut warnings = Vec::new();
        let mut compiled = Vec::with_capacity(rules.len());

        for rule in rules {
            let mut patterns = Vec::with_capacity(rule.patterns.len());
            for (i, source) in rule.patterns.iter().enumerate() {
                if source.is_empty() {
                    continue;
                }
                match PatternSpec::compile(RedactionType::CUSTOM, source) {
                    Ok(spec) => patterns.push(
                        spec.with_confidence(RULE_CONFIDENCE)
                            .for_rule(&rule.name, rule.mode),
                    ),
                    Err(e) => {
                        warn!(rule = %rule.name, index = i, error = %e, "skipping invalid rule pattern");
                        warnings.push(format!("rule '{}' pattern {} skipped: {}", rule.name, i, e));
                    }
                }
            }

            let conditions = rule
                .conditions
                .iter()
                .cloned()
                .enumerate()
                .map(|(i, condition)| {
                    let (compiled, error) = CompiledCondition::compile(condition);
                    if let Some(e) = error {
                        warn!(rule = %rule.name, index = i, error = %e, "condition regex never matches");
                        warnings.push(format!("rule '{}' condition {} never matches: {}", rule.name, i, e));
                    }
                    compiled
                })
                .collect();

            compiled.push(CompiledRule {
                rule: rule.clone(),
                patterns,
                conditions,
            });
        }

        Self {
            rules: compiled,
            warnings,
        }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Patterns of every applicable rule, in rule order
    pub fn applicable_patterns(
        &self,
        context: Option<&RequestContext>,
        user_id: Option<&str>,
    ) -> Vec<&PatternSpec> {
        self.rules
            .iter()
            .filter(|rule| rule.applies(context, user_id))
            .flat_map(|rule| rule.patterns.iter())
            .collect()
    }

    /// Rule candidates over `text`, to be resolved together with base detections
    pub fn detect(
        &self,
        text: &str,
        context: Option<&RequestContext>,
        user_id: Option<&str>,
    ) -> Vec<Redaction> {
        let patterns = self.applicable_patterns(context, user_id);
        // Rule patterns carry their own mode, the request mode is not consulted
        let candidates = Detector::default().detect(text, patterns, Default::default());
        debug!(rules = self.rules.len(), candidates = candidates.len(), "evaluated policy rules");
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_core::{ConditionOperator, Mode, PolicyCondition};
    use serde_json::json;

    fn account_rule(mode: Mode) -> PolicyRule {
        PolicyRule::new("account", mode)
            .with_pattern(r"ACCT-\d{6}")
            .with_field("messages.content")
    }

    #[test]
    fn test_field_scoping() {
        assert!(field_matches("messages", "content"));
        assert!(field_matches("content", "messages.content"));
        assert!(field_matches("metadata", "metadata"));
        assert!(!field_matches("metadata", "content"));
        assert!(field_matches("title", "title"));
        assert!(!field_matches("title", "content"));
    }

    #[test]
    fn test_rule_candidates() {
        let policy = CompiledPolicy::compile(&[account_rule(Mode::Mask)]);
        let candidates = policy.detect("ref ACCT-123456 end", None, None);

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.redaction_type, RedactionType::CUSTOM);
        assert_eq!(c.rule.as_deref(), Some("account"));
        assert_eq!(c.replacement, "***********");
        assert_eq!(c.confidence, RULE_CONFIDENCE);
    }

    #[test]
    fn test_replace_mode_label() {
        let policy = CompiledPolicy::compile(&[account_rule(Mode::Replace)]);
        let candidates = policy.detect("ACCT-000001", None, None);
        assert_eq!(candidates[0].replacement, "[POLICY_ACCOUNT_REDACTED]");

        let policy = CompiledPolicy::compile(&[account_rule(Mode::Tokenize)]);
        let candidates = policy.detect("ACCT-000001", None, None);
        assert_eq!(candidates[0].replacement, "[TOKEN_ACCOUNT]");
    }

    #[test]
    fn test_disabled_rule_ignored() {
        let mut rule = account_rule(Mode::Mask);
        rule.enabled = false;
        let policy = CompiledPolicy::compile(&[rule]);
        assert!(policy.detect("ACCT-123456", None, None).is_empty());
    }

    #[test]
    fn test_field_mismatch_skips_rule() {
        let policy = CompiledPolicy::compile(&[account_rule(Mode::Mask)]);
        let context = RequestContext::for_field("metadata");
        assert!(policy.detect("ACCT-123456", Some(&context), None).is_empty());

        let context = RequestContext::for_field("content");
        assert_eq!(policy.detect("ACCT-123456", Some(&context), None).len(), 1);

        let context = RequestContext::default();
        assert_eq!(policy.detect("ACCT-123456", Some(&context), None).len(), 1);
    }

    #[test]
    fn test_conditions_gate_rule() {
        let rule = account_rule(Mode::Remove).with_condition(PolicyCondition::new(
            "user_role",
            ConditionOperator::Ne,
            json!("admin"),
        ));
        let policy = CompiledPolicy::compile(&[rule]);

        let mut context = RequestContext::for_field("content");
        context.user_role = "support".into();
        assert_eq!(policy.detect("ACCT-123456", Some(&context), None).len(), 1);

        context.user_role = "admin".into();
        assert!(policy.detect("ACCT-123456", Some(&context), None).is_empty());
    }

    #[test]
    fn test_invalid_pattern_skipped_with_warning() {
        let rule = PolicyRule::new("mixed", Mode::Replace)
            .with_pattern("[broken")
            .with_pattern(r"SECRET-\w+")
            .with_field("content");
        let policy = CompiledPolicy::compile(&[rule]);

        assert_eq!(policy.warnings.len(), 1);
        assert!(policy.warnings[0].contains("mixed"));
        assert_eq!(policy.rules()[0].patterns().len(), 1);
        assert_eq!(policy.detect("SECRET-abc", None, None).len(), 1);
    }

    #[test]
    fn test_multiple_fields_do_not_duplicate() {
        let rule = account_rule(Mode::Mask).with_field("content").with_field("messages");
        let policy = CompiledPolicy::compile(&[rule]);
        let context = RequestContext::for_field("content");
        assert_eq!(policy.detect("ACCT-123456", Some(&context), None).len(), 1);
    }
}
