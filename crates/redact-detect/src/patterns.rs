//! Pattern set: redaction type -> compiled regex, confidence, replacement label

use lazy_static::lazy_static;
use redact_core::{Mode, RedactError, RedactionType, Result};
use regex::Regex;

/// Confidence assigned to built-in regex matches
pub const BUILTIN_CONFIDENCE: f64 = 0.95;

lazy_static! {
    // Built-in patterns, in registration order. `(?i)` is attached per type where wanted.
    static ref BUILTIN_PATTERNS: Vec<(RedactionType, Regex)> = vec![
        (
            RedactionType::EMAIL,
            Regex::new(r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap(),
        ),
        (
            RedactionType::PHONE,
            Regex::new(r"\b(\+?1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b").unwrap(),
        ),
        (
            RedactionType::CREDIT_CARD,
            Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").unwrap(),
        ),
        (RedactionType::SSN, Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        (
            RedactionType::IP_ADDRESS,
            Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap(),
        ),
        (
            RedactionType::DATE,
            Regex::new(r"\b(?:0?[1-9]|1[012])[-/](?:0?[1-9]|[12][0-9]|3[01])[-/](?:19|20)\d{2}\b").unwrap(),
        ),
        (
            RedactionType::TIME,
            Regex::new(r"\b(?:[01]?[0-9]|2[0-3]):[0-5][0-9](?::[0-5][0-9])?\s*(?:AM|PM|am|pm)?\b").unwrap(),
        ),
        (
            RedactionType::LINK,
            Regex::new(r#"\b(?:https?://|www\.)[^\s<>"{}|\\^`\[\]]+"#).unwrap(),
        ),
        (RedactionType::ZIP_CODE, Regex::new(r"\b\d{5}-\d{4}\b").unwrap()),
        (
            RedactionType::PO_BOX,
            Regex::new(r"\b(?:P\.?O\.?\s*Box|Post\s*Office\s*Box|PO\s*Box)\s+\d+\b").unwrap(),
        ),
        (
            RedactionType::BTC_ADDRESS,
            Regex::new(r"\b[13][a-km-zA-HJ-NP-Z1-9]{25,34}\b").unwrap(),
        ),
        (RedactionType::MD5_HEX, Regex::new(r"\b[a-fA-F0-9]{32}\b").unwrap()),
        (RedactionType::SHA1_HEX, Regex::new(r"\b[a-fA-F0-9]{40}\b").unwrap()),
        (RedactionType::SHA256_HEX, Regex::new(r"\b[a-fA-F0-9]{64}\b").unwrap()),
        (
            RedactionType::GUID,
            Regex::new(r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b").unwrap(),
        ),
        (
            RedactionType::ISBN,
            Regex::new(r"\b(?:ISBN(?:-1[03])?\s*:?\s*)?[0-9X]{10}(?:[-\s][0-9X]{3}){3}\b").unwrap(),
        ),
        (
            RedactionType::MAC_ADDRESS,
            Regex::new(r"\b(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}\b").unwrap(),
        ),
        (
            RedactionType::IBAN,
            Regex::new(r"\b[A-Z]{2}[0-9]{2}[A-Z0-9]{4}[0-9]{7}(?:[A-Z0-9]?){0,16}\b").unwrap(),
        ),
        (
            RedactionType::GIT_REPO,
            Regex::new(r"\b(?:git@|https?://)(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(?:/[a-zA-Z0-9_.-]+)*\.git\b").unwrap(),
        ),
        // UK: two letters, six digits, A-D (AB123456C)
        (
            RedactionType::UK_NATIONAL_INSURANCE,
            Regex::new(r"(?i)\b[A-Z]{2}\d{6}[A-D]\b").unwrap(),
        ),
        (
            RedactionType::UK_NHS_NUMBER,
            Regex::new(r"(?i)\bNHS\s+Numbers?\s*:?\s*\d{3}\s\d{3}\s\d{4}\b|\bNHS:?\s*\d{10}\b|\bNHS\s+\d{3}\s\d{3}\s\d{4}\b").unwrap(),
        ),
        (
            RedactionType::UK_POSTCODE,
            Regex::new(r"(?i)\b[A-Z]{1,2}[0-9][A-Z0-9]?\s?[0-9][A-Z]{2}\b").unwrap(),
        ),
        (
            RedactionType::UK_PHONE_NUMBER,
            Regex::new(r"(?i)\+44\s?\d{2,4}\s?\d{3,4}\s?\d{3,4}").unwrap(),
        ),
        (
            RedactionType::UK_MOBILE_NUMBER,
            Regex::new(r"(?i)\b07\d{9}\b|07\s?\d{3}\s?\d{3}\s?\d{3}").unwrap(),
        ),
        (
            RedactionType::UK_SORT_CODE,
            Regex::new(r"(?i)\b\d{2}-\d{2}-\d{2}\b").unwrap(),
        ),
        (
            RedactionType::UK_IBAN,
            Regex::new(r"(?i)\bGB\d{2}\s?[A-Z]{4}\s?\d{4}\s?\d{4}\s?\d{4}\s?\d{2}\b").unwrap(),
        ),
        (
            RedactionType::UK_COMPANY_NUMBER,
            Regex::new(r"(?i)\b(?:Company\s+(?:No\.?|Number)\s*:?\s*)?\d{8}\b").unwrap(),
        ),
        // MORGA657054SM9IJ
        (
            RedactionType::UK_DRIVING_LICENSE,
            Regex::new(r"(?i)\b[A-Z]{5}\d{6}[A-Z]{2}\d[A-Z]{2}\b").unwrap(),
        ),
        (
            RedactionType::UK_PASSPORT_NUMBER,
            Regex::new(r"(?i)\b(?:Passport\s+(?:No\.?|Number)\s*:?\s*)?\d{9}\b").unwrap(),
        ),
    ];
}

/// Placeholder used in `replace` mode for a type
pub fn replacement_label(redaction_type: &RedactionType) -> String {
    let label = match redaction_type.as_str() {
        "email" => "EMAIL",
        "phone" => "PHONE",
        "credit_card" => "CREDIT_CARD",
        "ssn" => "SSN",
        "address" => "ADDRESS",
        "name" => "NAME",
        "ip_address" => "IP_ADDRESS",
        "date" => "DATE",
        "time" => "TIME",
        "link" => "LINK",
        "zip_code" => "ZIP_CODE",
        "po_box" => "PO_BOX",
        "btc_address" => "BTC_ADDRESS",
        "md5_hex" => "MD5_HASH",
        "sha1_hex" => "SHA1_HASH",
        "sha256_hex" => "SHA256_HASH",
        "guid" => "GUID",
        "isbn" => "ISBN",
        "mac_address" => "MAC_ADDRESS",
        "iban" => "IBAN",
        "git_repo" => "GIT_REPO",
        "uk_national_insurance" => "UK_NATIONAL_INSURANCE",
        "uk_nhs_number" => "UK_NHS_NUMBER",
        "uk_postcode" => "UK_POSTCODE",
        "uk_phone_number" => "UK_PHONE_NUMBER",
        "uk_mobile_number" => "UK_MOBILE_NUMBER",
        "uk_sort_code" => "UK_SORT_CODE",
        "uk_iban" => "UK_IBAN",
        "uk_company_number" => "UK_COMPANY_NUMBER",
        "uk_driving_license" => "UK_DRIVING_LICENSE",
        "uk_passport_number" => "UK_PASSPORT_NUMBER",
        _ => return "[REDACTED]".to_string(),
    };
    format!("[{}_REDACTED]", label)
}

/// Fixed ranking used to break length ties (higher wins)
pub fn type_priority(redaction_type: &RedactionType) -> u32 {
    match redaction_type.as_str() {
        "uk_national_insurance" | "uk_nhs_number" | "uk_passport_number" => 100,
        "uk_driving_license" | "uk_iban" | "uk_sort_code" => 90,
        "uk_phone_number" | "uk_mobile_number" | "uk_company_number" => 80,
        "uk_postcode" => 70,
        "ssn" | "credit_card" => 60,
        "email" | "phone" => 50,
        "ip_address" | "date" | "time" => 40,
        _ => 30,
    }
}

/// One compiled detection pattern
#[derive(Debug, Clone)]
pub struct PatternSpec {
    pub redaction_type: RedactionType,
    pub regex: Regex,
    pub confidence: f64,
    /// Placeholder in `replace` mode
    pub label: String,
    /// Upper-case tag for the other placeholder modes (`[TOKEN_<tag>]`)
    pub tag: String,
    /// Mode pinned by the pattern's owner (policy rules); `None` follows the request
    pub mode: Option<Mode>,
    /// Policy rule that contributed this pattern
    pub rule: Option<String>,
}

impl PatternSpec {
    pub fn new(redaction_type: RedactionType, regex: Regex) -> Self {
        let label = replacement_label(&redaction_type);
        let tag = redaction_type.as_str().to_uppercase();
        Self {
            redaction_type,
            regex,
            confidence: BUILTIN_CONFIDENCE,
            label,
            tag,
            mode: None,
            rule: None,
        }
    }

    /// Compile a pattern, mapping a syntax error to `InvalidPattern`
    pub fn compile(redaction_type: RedactionType, source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|source| RedactError::InvalidPattern {
            name: redaction_type.to_string(),
            source,
        })?;
        Ok(Self::new(redaction_type, regex))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Pin the pattern to a policy rule and its mode
    pub fn for_rule(mut self, rule: &str, mode: Mode) -> Self {
        let tag = rule.to_uppercase();
        self.label = format!("[POLICY_{}_REDACTED]", tag);
        self.tag = tag;
        self.mode = Some(mode);
        self.rule = Some(rule.to_string());
        self
    }
}

/// Type filter applied when selecting patterns for a request
#[derive(Debug, Clone, Default)]
pub struct TypeFilter {
    /// Empty = everything
    pub enabled: Vec<RedactionType>,
    pub disabled: Vec<RedactionType>,
}

impl TypeFilter {
    pub fn allows(&self, redaction_type: &RedactionType) -> bool {
        (self.enabled.is_empty() || self.enabled.contains(redaction_type))
            && !self.disabled.contains(redaction_type)
    }
}

/// Registered patterns in deterministic order. Read-only during detection.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<PatternSpec>,
}

impl PatternSet {
    /// All built-in patterns
    pub fn new() -> Self {
        let patterns = BUILTIN_PATTERNS
            .iter()
            .map(|(redaction_type, regex)| PatternSpec::new(redaction_type.clone(), regex.clone()))
            .collect();

        Self { patterns }
    }

    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    /// Register (or replace) a named pattern. Invalid regexes are rejected and leave the set unchanged.
    pub fn add_custom_pattern(&mut self, name: &str, source: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(RedactError::InvalidInput(
                "custom pattern name cannot be empty".to_string(),
            ));
        }
        let spec = PatternSpec::compile(RedactionType::from(name), source)?;
        self.insert(spec);
        Ok(())
    }

    pub fn insert(&mut self, spec: PatternSpec) {
        match self
            .patterns
            .iter_mut()
            .find(|p| p.redaction_type == spec.redaction_type)
        {
            Some(existing) => *existing = spec,
            None => self.patterns.push(spec),
        }
    }

    pub fn remove(&mut self, redaction_type: &RedactionType) -> bool {
        let before = self.patterns.len();
        self.patterns.retain(|p| &p.redaction_type != redaction_type);
        self.patterns.len() != before
    }

    /// Patterns allowed by the filter, in registration order
    pub fn select<'a>(&'a self, filter: &'a TypeFilter) -> impl Iterator<Item = &'a PatternSpec> + 'a {
        self.patterns.iter().filter(move |p| filter.allows(&p.redaction_type))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternSpec> {
        self.patterns.iter()
    }

    pub fn get(&self, redaction_type: &RedactionType) -> Option<&PatternSpec> {
        self.patterns.iter().find(|p| &p.redaction_type == redaction_type)
    }

    pub fn types(&self) -> Vec<RedactionType> {
        self.patterns.iter().map(|p| p.redaction_type.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}
