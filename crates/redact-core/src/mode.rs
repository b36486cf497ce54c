//! Redaction modes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RedactError;

/// How a detected span is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Labeled placeholder, e.g. `[EMAIL_REDACTED]`
    #[default]
    Replace,
    /// Same-length run of `*`
    Mask,
    /// Empty string
    Remove,
    Tokenize,
    Hash,
    Encrypt,
    /// Context-aware model redaction. Recognised so rules deserialize, never executed.
    Llm,
}

impl Mode {
    /// Modes a policy rule may use
    pub const RULE_MODES: [Mode; 6] = [
        Mode::Replace,
        Mode::Mask,
        Mode::Remove,
        Mode::Tokenize,
        Mode::Hash,
        Mode::Encrypt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Replace => "replace",
            Mode::Mask => "mask",
            Mode::Remove => "remove",
            Mode::Tokenize => "tokenize",
            Mode::Hash => "hash",
            Mode::Encrypt => "encrypt",
            Mode::Llm => "llm",
        }
    }

    pub fn is_supported(&self) -> bool {
        Self::RULE_MODES.contains(self)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = RedactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Mode::Replace),
            "mask" => Ok(Mode::Mask),
            "remove" => Ok(Mode::Remove),
            "tokenize" => Ok(Mode::Tokenize),
            "hash" => Ok(Mode::Hash),
            "encrypt" => Ok(Mode::Encrypt),
            "llm" => Ok(Mode::Llm),
            other => Err(RedactError::InvalidInput(format!(
                "invalid redaction mode: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("mask".parse::<Mode>().unwrap(), Mode::Mask);
        assert_eq!(" Replace ".parse::<Mode>().unwrap(), Mode::Replace);
        assert!("shred".parse::<Mode>().is_err());
    }

    #[test]
    fn test_llm_not_supported() {
        assert!(!Mode::Llm.is_supported());
        assert!(Mode::RULE_MODES.iter().all(|m| m.is_supported()));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Mode::Tokenize).unwrap();
        assert_eq!(json, "\"tokenize\"");
        let parsed: Mode = serde_json::from_str("\"encrypt\"").unwrap();
        assert_eq!(parsed, Mode::Encrypt);
    }
}
