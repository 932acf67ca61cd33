use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::error::{MirageError, MirageResult};

/// Main engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub generator: GeneratorConfig,
    pub cache: CacheConfig,
    pub prompts: PromptConfig,
}

/// Generative service client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Explicit API key; takes precedence over the environment variable
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

/// Durable data cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one cache file per table
    pub directory: PathBuf,
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Template file for schema generation; built-in default when absent
    pub schema_template_file: Option<PathBuf>,
    /// Template file for data generation; built-in default when absent
    pub data_template_file: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-2024-08-06".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 120,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".cache"),
        }
    }
}

impl GeneratorConfig {
    /// Resolve the API key from the explicit setting or the environment.
    /// Empty values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.is_empty())
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> MirageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MirageError::Configuration(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            MirageError::Configuration(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();

        assert_eq!(config.generator.api_base, "https://api.openai.com/v1");
        assert_eq!(config.generator.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.generator.timeout_seconds, 120);
        assert_eq!(config.cache.directory, PathBuf::from(".cache"));
        assert!(config.prompts.schema_template_file.is_none());
        assert!(config.prompts.data_template_file.is_none());
    }

    #[test]
    fn test_explicit_api_key_wins_over_environment() {
        let config = GeneratorConfig {
            api_key: Some("sk-explicit".to_string()),
            ..GeneratorConfig::default()
        };

        assert_eq!(config.resolve_api_key(), Some("sk-explicit".to_string()));
    }

    #[test]
    fn test_missing_api_key_resolves_to_none() {
        let config = GeneratorConfig {
            api_key_env: "MIRAGE_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            ..GeneratorConfig::default()
        };

        assert_eq!(config.resolve_api_key(), None);
    }

    #[test]
    fn test_empty_api_key_counts_as_absent() {
        let config = GeneratorConfig {
            api_key: Some(String::new()),
            api_key_env: "MIRAGE_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            ..GeneratorConfig::default()
        };

        assert_eq!(config.resolve_api_key(), None);
    }

    #[test]
    fn test_load_partial_config_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            r#"{"generator": {"model": "gpt-4o-mini"}, "cache": {"directory": "/tmp/mirage-test"}}"#
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();

        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert_eq!(config.generator.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.cache.directory, PathBuf::from("/tmp/mirage-test"));
    }

    #[test]
    fn test_load_missing_config_file_fails() {
        let result = EngineConfig::load(Path::new("/nonexistent/mirage.json"));

        assert!(matches!(result, Err(MirageError::Configuration(_))));
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = EngineConfig::load(file.path());

        assert!(matches!(result, Err(MirageError::Configuration(_))));
    }
}
