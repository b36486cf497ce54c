//! Policy-aware decorator over the base engine

use redact_config::Config;
use redact_core::{
    EngineCapabilities, EngineStats, PolicyRequest, PolicyRule, RedactionRequest, RedactionResult,
    RestoreResult, Result, ValidationError,
};
use redact_policy::{CompiledPolicy, validate};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::Engine;
use crate::provider::{RedactionProvider, ensure_active};

pub struct PolicyAwareEngine {
    engine: Engine,
}

impl PolicyAwareEngine {
    pub fn new() -> Self {
        Self::from_engine(Engine::new())
    }

    pub fn with_config(config: &Config) -> Self {
        Self::from_engine(Engine::with_config(config))
    }

    pub fn from_engine(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Redact with the request's own rules. Rules are compiled for this call only.
    pub fn apply_policy_rules(&self, cancel: &CancellationToken, request: &PolicyRequest) -> Result<RedactionResult> {
        ensure_active(cancel)?;
        let policy = CompiledPolicy::compile(&request.rules);
        debug!(rules = policy.len(), "applying request policy");
        self.apply_compiled(cancel, &request.request, &policy, request.user_id.as_deref())
    }

    /// Redact with an already compiled rule set
    pub fn apply_compiled(
        &self,
        cancel: &CancellationToken,
        request: &RedactionRequest,
        policy: &CompiledPolicy,
        user_id: Option<&str>,
    ) -> Result<RedactionResult> {
        self.engine.run(cancel, request, Some(policy), user_id)
    }

    /// Every problem across every rule; empty means the rules are valid
    pub fn validate_policy(&self, rules: &[PolicyRule]) -> Vec<ValidationError> {
        validate(rules)
    }
}

impl Default for PolicyAwareEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionProvider for PolicyAwareEngine {
    fn redact(&self, cancel: &CancellationToken, request: &RedactionRequest) -> Result<RedactionResult> {
        self.engine.redact(cancel, request)
    }

    fn restore(&self, cancel: &CancellationToken, token: &str) -> Result<RestoreResult> {
        self.engine.restore(cancel, token)
    }

    fn capabilities(&self) -> EngineCapabilities {
        let mut caps = self
            .engine
            .capabilities()
            .with_feature("policy_rules")
            .with_feature("conditional_rules")
            .with_feature("field_scoping")
            .with_feature("policy_validation");
        caps.name = "PolicyAwareEngine".to_string();
        caps.supports_policies = true;
        caps
    }

    fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    fn cleanup(&self, cancel: &CancellationToken) -> Result<usize> {
        self.engine.cleanup(cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_core::{ConditionOperator, Mode, PolicyCondition, RedactError, RedactionType, RequestContext};
    use serde_json::json;

    fn engine() -> PolicyAwareEngine {
        let mut config = Config::default();
        config.vault.pbkdf2_iterations = 1000;
        PolicyAwareEngine::with_config(&config)
    }

    fn account_rule(mode: Mode) -> PolicyRule {
        PolicyRule::new("account", mode)
            .with_pattern(r"ACCT-\d{6}")
            .with_field("content")
    }

    #[test]
    fn test_rule_and_base_redactions_combined() {
        let engine = engine();
        let request = PolicyRequest::new(
            RedactionRequest::new("Account ACCT-123456 belongs to jane@example.com"),
            vec![account_rule(Mode::Mask)],
        );
        let result = engine.apply_policy_rules(&CancellationToken::new(), &request).unwrap();

        assert_eq!(result.redacted_text, "Account *********** belongs to [EMAIL_REDACTED]");
        assert_eq!(result.redactions.len(), 2);
        let rule_hit = result.redactions.iter().find(|r| r.rule.is_some()).unwrap();
        assert_eq!(rule_hit.redaction_type, RedactionType::CUSTOM);
        assert_eq!(rule_hit.original, "ACCT-123456");
    }

    #[test]
    fn test_overlapping_rule_and_base_resolved_once() {
        let engine = engine();
        // Rule pattern swallows the e-mail address entirely
        let rule = PolicyRule::new("contact", Mode::Replace)
            .with_pattern(r"contact: \S+@\S+")
            .with_field("content");
        let request = PolicyRequest::new(RedactionRequest::new("contact: jane@example.com"), vec![rule]);
        let result = engine.apply_policy_rules(&CancellationToken::new(), &request).unwrap();

        assert_eq!(result.redactions.len(), 1);
        assert_eq!(result.redacted_text, "[POLICY_CONTACT_REDACTED]");
    }

    #[test]
    fn test_rule_scoped_to_other_field() {
        let engine = engine();
        let request = PolicyRequest::new(
            RedactionRequest::new("ACCT-123456").with_context(RequestContext::for_field("metadata")),
            vec![account_rule(Mode::Remove)],
        );
        let result = engine.apply_policy_rules(&CancellationToken::new(), &request).unwrap();
        assert!(result.redactions.is_empty());
        assert_eq!(result.redacted_text, "ACCT-123456");
    }

    #[test]
    fn test_user_id_condition() {
        let engine = engine();
        let rule = account_rule(Mode::Remove).with_condition(PolicyCondition::new(
            "user_id",
            ConditionOperator::In,
            json!(["u1", "u2"]),
        ));
        let mut request = PolicyRequest::new(
            RedactionRequest::new("x ACCT-123456").with_context(RequestContext::for_field("content")),
            vec![rule],
        );

        request.user_id = Some("u2".into());
        let result = engine.apply_policy_rules(&CancellationToken::new(), &request).unwrap();
        assert_eq!(result.redacted_text, "x ");

        request.user_id = Some("u9".into());
        let result = engine.apply_policy_rules(&CancellationToken::new(), &request).unwrap();
        assert_eq!(result.redacted_text, "x ACCT-123456");
    }

    #[test]
    fn test_invalid_rule_pattern_is_warning() {
        let engine = engine();
        let rule = PolicyRule::new("broken", Mode::Replace)
            .with_pattern("[nope")
            .with_field("content");
        let request = PolicyRequest::new(RedactionRequest::new("mail a@b.com"), vec![rule]);
        let result = engine.apply_policy_rules(&CancellationToken::new(), &request).unwrap();

        assert_eq!(result.redactions.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_reversible_policy_request() {
        let engine = engine();
        let text = "ACCT-123456";
        let request = PolicyRequest::new(RedactionRequest::new(text).reversible(None), vec![account_rule(Mode::Tokenize)]);
        let cancel = CancellationToken::new();
        let result = engine.apply_policy_rules(&cancel, &request).unwrap();

        assert_eq!(result.redacted_text, "[TOKEN_ACCOUNT]");
        let restored = engine.restore(&cancel, result.token.as_deref().unwrap()).unwrap();
        assert_eq!(restored.original_text, text);
    }

    #[test]
    fn test_validate_policy() {
        let engine = engine();
        let errors = engine.validate_policy(&[PolicyRule::new("", Mode::Llm)]);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_cancelled_policy_request() {
        let engine = engine();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = PolicyRequest::new(RedactionRequest::new("a@b.com"), vec![]);
        assert!(matches!(engine.apply_policy_rules(&cancel, &request), Err(RedactError::Cancelled)));
    }

    #[test]
    fn test_capabilities() {
        let caps = engine().capabilities();
        assert_eq!(caps.name, "PolicyAwareEngine");
        assert!(caps.supports_policies);
        assert!(caps.has_feature("policy_rules"));
        assert!(caps.has_feature("reversible_tokens"));
    }
}
