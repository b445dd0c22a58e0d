//! Process-wide configuration, loaded from TOML.
//!
//! The original implementation loads `~/.config/litassist/config.yaml` via
//! PyYAML. This crate loads the same field set from
//! `~/.config/litassist/config.toml` instead — see DESIGN.md for the
//! substitution rationale. `LITASSIST_CONFIG` overrides the path, exactly as
//! the original's `config.py` does for its YAML file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

fn default_or_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_emb_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_true() -> bool {
    true
}

fn default_token_limit() -> u32 {
    16384
}

fn default_heartbeat_interval() -> u64 {
    20
}

fn default_max_chars() -> usize {
    200_000
}

fn default_rag_max_chars() -> usize {
    8_000
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_fetch_time() -> u64 {
    300
}

fn default_selenium_timeout_multiplier() -> u32 {
    2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Markdown,
}

/// Raw TOML shape. Required string keys are `Option<String>` here so that
/// absence can be turned into a `ConfigError::MissingKey` naming the exact
/// dotted path, matching the original's `KeyError` -> `ConfigError` behavior.
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    openrouter: RawOpenRouter,
    #[serde(default)]
    openai: RawOpenAi,
    #[serde(default)]
    google_cse: RawGoogleCse,
    #[serde(default)]
    pinecone: RawPinecone,
    #[serde(default)]
    jina_reader: RawJinaReader,
    #[serde(default = "default_true")]
    use_token_limits: bool,
    #[serde(default = "default_token_limit")]
    token_limit: u32,
    #[serde(default = "default_heartbeat_interval")]
    heartbeat_interval: u64,
    #[serde(default = "default_max_chars")]
    max_chars: usize,
    #[serde(default = "default_rag_max_chars")]
    rag_max_chars: usize,
    #[serde(default = "default_log_format")]
    log_format: LogFormat,
    #[serde(default)]
    offline_validation: bool,
    #[serde(default = "default_fetch_timeout")]
    fetch_timeout: u64,
    #[serde(default = "default_max_fetch_time")]
    max_fetch_time: u64,
    #[serde(default = "default_true")]
    selenium_enabled: bool,
    #[serde(default = "default_selenium_timeout_multiplier")]
    selenium_timeout_multiplier: u32,
}

#[derive(Debug, Deserialize, Default)]
struct RawOpenRouter {
    api_key: Option<String>,
    #[serde(default = "default_or_base")]
    base_url: String,
}

#[derive(Debug, Deserialize, Default)]
struct RawOpenAi {
    api_key: Option<String>,
    #[serde(default = "default_emb_model")]
    embedding_model: String,
}

#[derive(Debug, Deserialize, Default)]
struct RawGoogleCse {
    api_key: Option<String>,
    cse_id: Option<String>,
    cse_id_comprehensive: Option<String>,
    cse_id_austlii: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawPinecone {
    api_key: Option<String>,
    environment: Option<String>,
    index: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawJinaReader {
    api_key: Option<String>,
}

/// Fully validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub or_key: String,
    pub or_base: String,
    pub oa_key: String,
    pub emb_model: String,
    pub g_key: String,
    pub cse_id: String,
    pub cse_id_comprehensive: String,
    pub cse_id_austlii: String,
    pub jina_api_key: Option<String>,
    pub pc_key: String,
    pub pc_env: String,
    pub pc_index: String,
    pub use_token_limits: bool,
    pub token_limit: u32,
    pub heartbeat_interval: u64,
    pub max_chars: usize,
    pub rag_max_chars: usize,
    pub log_format: LogFormat,
    pub offline_validation: bool,
    pub fetch_timeout: u64,
    pub max_fetch_time: u64,
    pub selenium_enabled: bool,
    pub selenium_timeout_multiplier: u32,
}

impl Config {
    /// Load configuration from `LITASSIST_CONFIG` if set, else
    /// `~/.config/litassist/config.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::find_config_file()?;
        let text = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::validate(raw)
    }

    fn find_config_file() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("LITASSIST_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = std::env::var("HOME").map_err(|_| {
            ConfigError::NotFound("~/.config/litassist/config.toml".to_string())
        })?;
        let candidate: PathBuf = Path::new(&home)
            .join(".config")
            .join("litassist")
            .join("config.toml");
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(ConfigError::NotFound(candidate.display().to_string()))
        }
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let or_key = raw
            .openrouter
            .api_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("openrouter.api_key".to_string()))?;
        let oa_key = raw
            .openai
            .api_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("openai.api_key".to_string()))?;
        let g_key = raw
            .google_cse
            .api_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("google_cse.api_key".to_string()))?;
        let cse_id = raw
            .google_cse
            .cse_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("google_cse.cse_id".to_string()))?;
        let pc_key = raw
            .pinecone
            .api_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("pinecone.api_key".to_string()))?;
        let pc_env = raw
            .pinecone
            .environment
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("pinecone.environment".to_string()))?;
        let pc_index = raw
            .pinecone
            .index
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("pinecone.index".to_string()))?;

        Ok(Config {
            or_key,
            or_base: raw.openrouter.base_url,
            oa_key,
            emb_model: raw.openai.embedding_model,
            g_key,
            cse_id,
            cse_id_comprehensive: raw.google_cse.cse_id_comprehensive.unwrap_or_default(),
            cse_id_austlii: raw.google_cse.cse_id_austlii.unwrap_or_default(),
            jina_api_key: raw.jina_reader.api_key,
            pc_key,
            pc_env,
            pc_index,
            use_token_limits: raw.use_token_limits,
            token_limit: raw.token_limit,
            heartbeat_interval: raw.heartbeat_interval,
            max_chars: raw.max_chars,
            rag_max_chars: raw.rag_max_chars,
            log_format: raw.log_format,
            offline_validation: raw.offline_validation,
            fetch_timeout: raw.fetch_timeout,
            max_fetch_time: raw.max_fetch_time,
            selenium_enabled: raw.selenium_enabled,
            selenium_timeout_multiplier: raw.selenium_timeout_multiplier,
        })
    }

    /// True if any secret still holds the placeholder form shipped in the
    /// example config (mirrors the original's `using_placeholders`).
    pub fn using_placeholders(&self) -> bool {
        [&self.or_key, &self.oa_key, &self.g_key, &self.pc_key]
            .iter()
            .any(|s| s.contains("YOUR_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [openrouter]
        api_key = "sk-or-test"

        [openai]
        api_key = "sk-oa-test"

        [google_cse]
        api_key = "g-test"
        cse_id = "cse-test"

        [pinecone]
        api_key = "pc-test"
        environment = "us-west1-gcp"
        index = "litassist"
    "#;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let cfg = Config::from_toml_str(MINIMAL).expect("should parse");
        assert_eq!(cfg.or_base, "https://openrouter.ai/api/v1");
        assert_eq!(cfg.emb_model, "text-embedding-3-small");
        assert!(cfg.use_token_limits);
        assert_eq!(cfg.token_limit, 16384);
        assert_eq!(cfg.heartbeat_interval, 20);
        assert!(matches!(cfg.log_format, LogFormat::Json));
    }

    #[test]
    fn missing_required_key_names_dotted_path() {
        let text = r#"
            [openai]
            api_key = "sk-oa-test"
        "#;
        let err = Config::from_toml_str(text).unwrap_err();
        match err {
            ConfigError::MissingKey(path) => assert_eq!(path, "openrouter.api_key"),
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn detects_placeholder_keys() {
        let text = r#"
            [openrouter]
            api_key = "YOUR_OPENROUTER_KEY"

            [openai]
            api_key = "sk-oa-test"

            [google_cse]
            api_key = "g-test"
            cse_id = "cse-test"

            [pinecone]
            api_key = "pc-test"
            environment = "us-west1-gcp"
            index = "litassist"
        "#;
        let cfg = Config::from_toml_str(text).unwrap();
        assert!(cfg.using_placeholders());
    }
}
