use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::ai::ollama::DEFAULT_OLLAMA_URL;
use crate::conversation::{DEFAULT_FALLBACK, DEFAULT_WELCOME};
use crate::error::ConfigError;
use crate::provider::Provider;

pub const DEFAULT_BOT_NAME: &str = "Arsyad AI";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub ollama_url: Option<String>,
    pub bot_name: Option<String>,
    pub welcome_message: Option<String>,
    pub fallback_message: Option<String>,
    pub system_instruction: Option<String>,
}

impl Config {
    /// Load `~/.config/arsyad/config.json` (defaults if missing), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Override file values with `GEMINI_API_KEY` (or `API_KEY`),
    /// `ARSYAD_PROVIDER` and `ARSYAD_MODEL` when set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.gemini_api_key = Some(key);
        }
        if let Some(provider) = non_empty("ARSYAD_PROVIDER") {
            self.provider = Some(provider);
        }
        if let Some(model) = non_empty("ARSYAD_MODEL") {
            self.model = Some(model);
        }
    }

    pub fn provider(&self) -> Result<Provider, ConfigError> {
        self.provider
            .as_deref()
            .map(Provider::parse)
            .unwrap_or(Ok(Provider::default()))
    }

    /// Configured model, or the provider's default.
    pub fn model(&self) -> String {
        match &self.model {
            Some(model) => model.clone(),
            None => self.provider().unwrap_or_default().default_model().to_string(),
        }
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn bot_name(&self) -> &str {
        self.bot_name.as_deref().unwrap_or(DEFAULT_BOT_NAME)
    }

    pub fn welcome_message(&self) -> &str {
        self.welcome_message.as_deref().unwrap_or(DEFAULT_WELCOME)
    }

    pub fn fallback_message(&self) -> &str {
        self.fallback_message.as_deref().unwrap_or(DEFAULT_FALLBACK)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("arsyad").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.provider().unwrap(), Provider::Gemini);
        assert_eq!(config.model(), "gemini-2.0-flash");
        assert_eq!(config.bot_name(), DEFAULT_BOT_NAME);
        assert_eq!(config.welcome_message(), DEFAULT_WELCOME);
        assert_eq!(config.fallback_message(), DEFAULT_FALLBACK);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            provider: Some("ollama".to_string()),
            model: Some("gemma3:latest".to_string()),
            ollama_url: Some("http://10.0.0.2:11434".to_string()),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.ollama_url(), "http://10.0.0.2:11434");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"bot_name": "Kiki"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.bot_name(), "Kiki");
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config {
            gemini_api_key: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_env(env(&[
            ("GEMINI_API_KEY", "from-env"),
            ("ARSYAD_PROVIDER", "ollama"),
            ("ARSYAD_MODEL", "phi3"),
        ]));

        assert_eq!(config.gemini_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.provider().unwrap(), Provider::Ollama);
        assert_eq!(config.model(), "phi3");
    }

    #[test]
    fn test_api_key_fallback_and_blank_values() {
        let mut config = Config::default();
        config.apply_env(env(&[("GEMINI_API_KEY", "  "), ("API_KEY", "generic")]));
        assert_eq!(config.gemini_api_key.as_deref(), Some("generic"));
        assert!(config.provider.is_none());
    }

    #[test]
    fn test_default_model_follows_provider() {
        let config = Config {
            provider: Some("ollama".to_string()),
            ..Config::default()
        };
        assert_eq!(config.model(), "llama3.2:latest");
    }
}
