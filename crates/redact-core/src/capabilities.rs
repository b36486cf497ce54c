use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Mode, RedactionType};

/// What an engine layer can do
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineCapabilities {
    pub name: String,
    pub version: String,
    pub supported_types: Vec<RedactionType>,
    pub supported_modes: Vec<Mode>,
    pub supports_reversible: bool,
    pub supports_custom_patterns: bool,
    pub supports_policies: bool,
    pub supports_multi_tenant: bool,
    pub max_text_length: usize,
    pub features: BTreeMap<String, bool>,
}

impl EngineCapabilities {
    pub fn with_feature(mut self, feature: &str) -> Self {
        self.features.insert(feature.to_string(), true);
        self
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.get(feature).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStats {
    pub active_patterns: usize,
    pub total_tokens: usize,
    pub key_version: u32,
    pub retained_keys: usize,
    pub tokens_by_key_version: BTreeMap<u32, usize>,
}
