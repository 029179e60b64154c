//! Response collaborators
//!
//! A [`ResponseSource`] turns a user prompt into a reply string. The
//! conversation only ever talks to this trait; the HTTP clients below are
//! thin wrappers around each backend's generate endpoint.

pub mod gemini;
pub mod ollama;

use std::sync::Arc;

use async_trait::async_trait;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use crate::config::Config;
use crate::error::{ConfigError, ResponseError};
use crate::provider::Provider;

#[async_trait]
pub trait ResponseSource: Send + Sync {
    /// Single attempt at answering `prompt`.
    async fn get_response(&self, prompt: &str) -> Result<String, ResponseError>;

    /// Short label for the UI, e.g. `Gemini: gemini-2.0-flash`.
    fn describe(&self) -> String;
}

/// Build the configured backend.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn ResponseSource>, ConfigError> {
    let provider = config.provider()?;
    let model = config.model();
    let system = config.system_instruction.clone();

    tracing::info!(provider = provider.as_str(), model = %model, "using backend");

    let source: Arc<dyn ResponseSource> = match provider {
        Provider::Gemini => {
            let api_key = config
                .gemini_api_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .ok_or(ConfigError::MissingApiKey("Gemini"))?;
            Arc::new(GeminiClient::new(api_key, &model).with_system_instruction(system))
        }
        Provider::Ollama => Arc::new(
            OllamaClient::new(config.ollama_url(), &model).with_system(system),
        ),
    };

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_requires_key() {
        let config = Config::default();
        assert!(matches!(
            backend_from_config(&config),
            Err(ConfigError::MissingApiKey("Gemini"))
        ));
    }

    #[test]
    fn test_gemini_backend_label() {
        let config = Config {
            gemini_api_key: Some("test-key".to_string()),
            ..Config::default()
        };
        let source = backend_from_config(&config).unwrap();
        assert_eq!(source.describe(), "Gemini: gemini-2.0-flash");
    }

    #[test]
    fn test_ollama_backend_needs_no_key() {
        let config = Config {
            provider: Some("ollama".to_string()),
            model: Some("gemma3:latest".to_string()),
            ..Config::default()
        };
        let source = backend_from_config(&config).unwrap();
        assert_eq!(source.describe(), "Ollama: gemma3:latest");
    }
}
