use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the redaction engine and `redactctl`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub vault: VaultConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Candidates scoring below this are dropped before conflict resolution
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Built-in types to run; empty means all of them
    #[serde(default)]
    pub enabled_types: Vec<String>,

    #[serde(default)]
    pub disabled_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Key versions kept after rotation so older tokens stay restorable
    #[serde(default = "default_retained_key_versions")]
    pub retained_key_versions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_text_length: default_max_text_length(),
            token_ttl_secs: default_token_ttl_secs(),
            confidence_threshold: default_confidence_threshold(),
            enabled_types: Vec::new(),
            disabled_types: Vec::new(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_pbkdf2_iterations(),
            retained_key_versions: default_retained_key_versions(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_max_text_length() -> usize {
    1024 * 1024
}

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_confidence_threshold() -> f64 {
    0.8
}

fn default_pbkdf2_iterations() -> u32 {
    10_000
}

fn default_retained_key_versions() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl EngineConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            Ok(config)
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "redact", "redact") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.redact/config.toml")
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.max_text_length == 0 {
            anyhow::bail!("engine.max_text_length must be positive");
        }
        if self.engine.token_ttl_secs == 0 {
            anyhow::bail!("engine.token_ttl_secs must be positive");
        }
        if !(0.0..=1.0).contains(&self.engine.confidence_threshold) {
            anyhow::bail!("engine.confidence_threshold must be between 0 and 1");
        }
        if self.vault.pbkdf2_iterations == 0 {
            anyhow::bail!("vault.pbkdf2_iterations must be positive");
        }
        if self.vault.retained_key_versions == 0 {
            anyhow::bail!("vault.retained_key_versions must be at least 1");
        }
        Ok(())
    }
}
