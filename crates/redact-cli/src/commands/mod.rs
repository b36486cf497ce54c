pub mod engine;
pub mod policy;
pub mod redact;

use anyhow::{Context, Result};
use redact_config::Config;
use redact_core::TenantPolicy;
use redact_engine::{RedactionProvider, TenantAwareEngine};
use std::path::Path;

pub fn version(config: &Config) -> Result<()> {
    let engine = TenantAwareEngine::in_memory(config);
    let caps = engine.capabilities();

    println!("redactctl {}", env!("CARGO_PKG_VERSION"));
    println!("  engine: {} {}", caps.name, caps.version);
    println!("  types: {}", caps.supported_types.len());
    println!(
        "  modes: {}",
        caps.supported_modes
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

/// Load a policy file. `.toml` files are parsed as TOML, everything else as JSON.
///
/// A file holding a bare array of rules is accepted as a policy with only rules.
pub fn load_policy_file(path: &Path) -> Result<TenantPolicy> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy file {}", path.display()))?;
    parse_policy(&content, is_toml(path))
        .with_context(|| format!("Failed to parse policy file {}", path.display()))
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("toml")
}

fn parse_policy(content: &str, toml: bool) -> Result<TenantPolicy> {
    if toml {
        return Ok(toml::from_str(content)?);
    }

    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        Ok(TenantPolicy {
            rules: serde_json::from_value(value)?,
            ..Default::default()
        })
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_core::Mode;
    use std::io::Write;

    #[test]
    fn test_parse_json_policy() {
        let policy = parse_policy(
            r#"{
                "rules": [{"name": "ticket", "patterns": ["TCK-\\d+"], "fields": ["content"], "mode": "mask"}],
                "default_mode": "mask",
                "compliance_reqs": ["GDPR"]
            }"#,
            false,
        )
        .unwrap();

        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.rules[0].mode, Mode::Mask);
        assert_eq!(policy.default_mode, Some(Mode::Mask));
        assert_eq!(policy.compliance_reqs, vec!["GDPR".to_string()]);
    }

    #[test]
    fn test_parse_bare_rule_array() {
        let policy = parse_policy(
            r#"[{"name": "a", "patterns": ["x"], "fields": ["content"], "mode": "remove"}]"#,
            false,
        )
        .unwrap();
        assert_eq!(policy.rules[0].name, "a");
        assert!(policy.custom_patterns.is_empty());
    }

    #[test]
    fn test_load_toml_policy_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
default_mode = "replace"

[[rules]]
name = "account"
patterns = ['ACCT-\d{{6}}']
fields = ["messages.content"]
mode = "mask"

[[custom_patterns]]
name = "employee_id"
pattern = 'EMP\d{{5}}'
"#
        )
        .unwrap();

        let policy = load_policy_file(file.path()).unwrap();
        assert_eq!(policy.rules[0].patterns, vec![r"ACCT-\d{6}".to_string()]);
        assert_eq!(policy.custom_patterns[0].name, "employee_id");
    }

    #[test]
    fn test_missing_policy_file() {
        let err = load_policy_file(Path::new("/nonexistent/policy.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read policy file"));
    }
}
