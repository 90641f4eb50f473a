use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::providers::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::providers::llm::{GenerationRequest, TextGenerator};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama client for both text generation and embeddings.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("Ollama API error {}: {}", status, body);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let body = self
            .post(
                "/api/generate",
                json!({
                    "model": request.model,
                    "prompt": request.prompt,
                    "system": request.system,
                    "stream": false,
                }),
            )
            .await?;

        let text = body["response"]
            .as_str()
            .ok_or_else(|| anyhow!("Invalid Ollama response"))?;

        Ok(text.to_string())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<f32>> {
        let body = self
            .post(
                "/api/embeddings",
                json!({
                    "model": request.model,
                    "prompt": request.prompt,
                }),
            )
            .await?;

        let embedding: Vec<f32> = serde_json::from_value(body["embedding"].clone())
            .map_err(|e| anyhow!("Invalid Ollama embedding: {}", e))?;

        Ok(embedding)
    }
}
