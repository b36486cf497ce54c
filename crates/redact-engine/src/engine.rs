//! Base engine: detect, resolve, rewrite, and optionally mint a token

use std::time::Duration;

use redact_config::Config;
use redact_core::{
    CustomPattern, EngineCapabilities, EngineStats, Mode, RedactError, Redaction, RedactionRequest,
    RedactionResult, RedactionType, RestoreResult, Result,
};
use redact_detect::{BUILTIN_CONFIDENCE, Detector, PatternSet, PatternSpec, TypeFilter, resolve, rewrite};
use redact_policy::CompiledPolicy;
use redact_vault::Vault;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::provider::{RedactionProvider, ensure_active};

pub const CUSTOM_LABEL: &str = "[CUSTOM_REDACTED]";

pub struct Engine {
    patterns: PatternSet,
    filter: TypeFilter,
    detector: Detector,
    vault: Vault,
    max_text_length: usize,
    default_ttl: Duration,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let filter = TypeFilter {
            enabled: config.engine.enabled_types.iter().map(|t| RedactionType::from(t.as_str())).collect(),
            disabled: config.engine.disabled_types.iter().map(|t| RedactionType::from(t.as_str())).collect(),
        };

        Self {
            patterns: PatternSet::new(),
            filter,
            detector: Detector::new(config.engine.confidence_threshold),
            vault: Vault::new(&config.vault),
            max_text_length: config.engine.max_text_length,
            default_ttl: config.engine.token_ttl(),
        }
    }

    /// Register a named pattern for every later request. Rejected if the regex is invalid.
    pub fn add_custom_pattern(&mut self, name: &str, pattern: &str) -> Result<()> {
        self.patterns.add_custom_pattern(name, pattern)?;
        debug!(name, "registered custom pattern");
        Ok(())
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Pattern types that pass the configured type filter
    pub fn active_types(&self) -> Vec<RedactionType> {
        self.patterns
            .select(&self.filter)
            .map(|p| p.redaction_type.clone())
            .collect()
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn max_text_length(&self) -> usize {
        self.max_text_length
    }

    pub fn rotate_keys(&self, cancel: &CancellationToken) -> Result<u32> {
        ensure_active(cancel)?;
        self.vault.rotate_keys()
    }

    /// Single pass over the original text: base, request-custom and policy candidates are
    /// resolved together and the text is rewritten once.
    pub(crate) fn run(
        &self,
        cancel: &CancellationToken,
        request: &RedactionRequest,
        policy: Option<&CompiledPolicy>,
        user_id: Option<&str>,
    ) -> Result<RedactionResult> {
        ensure_active(cancel)?;

        let text = request.text.as_str();
        if text.len() > self.max_text_length {
            return Err(RedactError::TextTooLong {
                len: text.len(),
                max: self.max_text_length,
            });
        }

        let mode = request.mode.unwrap_or_default();
        let mut warnings = Vec::new();

        let selected = self
            .patterns
            .select(&self.filter)
            .filter(|p| request.types.is_empty() || request.types.contains(&p.redaction_type));
        let mut candidates = self.detector.detect(text, selected, mode);

        let custom = compile_custom_patterns(
            &request.custom_patterns,
            self.detector.min_confidence,
            &mut warnings,
        );
        candidates.extend(self.detector.detect(text, &custom, mode));

        if let Some(policy) = policy {
            warnings.extend(policy.warnings.iter().cloned());
            candidates.extend(policy.detect(text, request.context.as_ref(), user_id));
        }

        let mut redactions = resolve(candidates);
        let redacted_text = rewrite(text, &redactions);

        let token = if request.reversible && !redactions.is_empty() {
            // Last point where a cancelled request leaves the vault untouched
            ensure_active(cancel)?;
            let ttl = request.ttl.filter(|ttl| !ttl.is_zero()).unwrap_or(self.default_ttl);
            Some(self.vault.mint(text, ttl)?)
        } else {
            None
        };

        redactions.sort_by(|a, b| b.start.cmp(&a.start));
        debug!(
            redactions = redactions.len(),
            reversible = token.is_some(),
            mode = %mode,
            "redacted text"
        );

        Ok(RedactionResult {
            original_text: request.text.clone(),
            redacted_text,
            redactions,
            token,
            timestamp: OffsetDateTime::now_utc(),
            warnings,
        })
    }

    /// Detection only, no rewriting or tokens. Useful for previews.
    pub fn detect(&self, text: &str) -> Vec<Redaction> {
        let candidates = self.detector.detect(text, self.patterns.select(&self.filter), Mode::Replace);
        resolve(candidates)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionProvider for Engine {
    fn redact(&self, cancel: &CancellationToken, request: &RedactionRequest) -> Result<RedactionResult> {
        self.run(cancel, request, None, None)
    }

    fn restore(&self, cancel: &CancellationToken, token: &str) -> Result<RestoreResult> {
        ensure_active(cancel)?;
        if token.is_empty() {
            return Err(RedactError::InvalidInput("token cannot be empty".to_string()));
        }
        self.vault.restore(token)
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            name: "Engine".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            supported_types: self.active_types(),
            supported_modes: Mode::RULE_MODES.to_vec(),
            supports_reversible: true,
            supports_custom_patterns: true,
            supports_policies: false,
            supports_multi_tenant: false,
            max_text_length: self.max_text_length,
            features: Default::default(),
        }
        .with_feature("reversible_tokens")
        .with_feature("key_rotation")
        .with_feature("conflict_resolution")
        .with_feature("custom_patterns")
        .with_feature("context_extraction")
    }

    fn stats(&self) -> EngineStats {
        let vault = self.vault.stats();
        EngineStats {
            active_patterns: self.patterns.select(&self.filter).count(),
            total_tokens: vault.total_tokens,
            key_version: vault.key_version,
            retained_keys: vault.retained_keys,
            tokens_by_key_version: vault.tokens_by_key_version,
        }
    }

    fn cleanup(&self, cancel: &CancellationToken) -> Result<usize> {
        ensure_active(cancel)?;
        Ok(self.vault.cleanup())
    }
}

/// Compile request-scoped patterns. Invalid ones, and ones the confidence threshold
/// would drop, become warnings.
fn compile_custom_patterns(
    patterns: &[CustomPattern],
    min_confidence: f64,
    warnings: &mut Vec<String>,
) -> Vec<PatternSpec> {
    let mut compiled = Vec::with_capacity(patterns.len());

    for custom in patterns {
        let name = if custom.name.trim().is_empty() {
            RedactionType::CUSTOM
        } else {
            RedactionType::from(custom.name.as_str())
        };

        if custom.pattern.is_empty() {
            warn!(pattern = %name, "skipping empty custom pattern");
            warnings.push(format!("custom pattern '{}' skipped: empty pattern", name));
            continue;
        }

        let confidence = custom.confidence.unwrap_or(BUILTIN_CONFIDENCE);
        if !(0.0..=1.0).contains(&confidence) {
            warn!(pattern = %name, confidence, "skipping custom pattern with out of range confidence");
            warnings.push(format!(
                "custom pattern '{}' skipped: confidence {} must be between 0 and 1",
                name, confidence
            ));
            continue;
        }
        if confidence < min_confidence {
            warn!(pattern = %name, confidence, min_confidence, "custom pattern below confidence threshold");
            warnings.push(format!(
                "custom pattern '{}' skipped: confidence {} is below the threshold {}",
                name, confidence, min_confidence
            ));
            continue;
        }

        match PatternSpec::compile(name.clone(), &custom.pattern) {
            Ok(spec) => compiled.push(
                spec.with_label(custom.replacement.clone().unwrap_or_else(|| CUSTOM_LABEL.to_string()))
                    .with_confidence(confidence),
            ),
            Err(e) => {
                warn!(pattern = %name, error = %e, "skipping invalid custom pattern");
                warnings.push(format!("custom pattern '{}' skipped: {}", name, e));
            }
        }
    }

    compiled
}
