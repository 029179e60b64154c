use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ResponseSource;
use crate::error::ResponseError;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    system: Option<String>,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            system: None,
        }
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }

    pub async fn query(&self, prompt: &str) -> Result<String, ResponseError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            system: self.system.as_deref(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ResponseError::Status {
                provider: "Ollama",
                status,
                body: if body.is_empty() {
                    "make sure Ollama is running with: ollama serve".to_string()
                } else {
                    body
                },
            });
        }

        let generated: GenerateResponse = response.json().await?;
        parse_generated(generated)
    }
}

fn parse_generated(generated: GenerateResponse) -> Result<String, ResponseError> {
    if generated.response.trim().is_empty() {
        Err(ResponseError::Empty("Ollama"))
    } else {
        Ok(generated.response)
    }
}

#[async_trait]
impl ResponseSource for OllamaClient {
    async fn get_response(&self, prompt: &str) -> Result<String, ResponseError> {
        self.query(prompt).await
    }

    fn describe(&self) -> String {
        format!("Ollama: {}", self.model)
    }
}
