//! Ollama generate-endpoint client
//!
//! Posts `{model, prompt, stream: false}` to an Ollama-compatible
//! `/api/generate` URL and reads the `response` field. Generator calls also
//! send the reply schema as `format` so the model emits structured output;
//! summarizer calls ask for free text.

use super::{reply_schema, Generator, Summarizer};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// HTTP client for a local Ollama service
#[derive(Debug, Clone)]
pub struct OllamaClient {
    api_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            client,
        })
    }

    fn request<'a>(&'a self, prompt: &'a str, format: Option<serde_json::Value>) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
        }
    }

    async fn post(&self, request: &GenerateRequest<'_>) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            prompt_chars = request.prompt.len(),
            structured = request.format.is_some(),
            "Ollama request"
        );

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&self.api_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Transport(format!("Ollama at {} timed out", self.api_url))
                } else if e.is_connect() {
                    Error::Transport(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.api_url
                    ))
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("Ollama API error ({}): {}", status, body)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedOutput(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::info!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Ollama response received"
        );
        Ok(parsed.response)
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.post(&self.request(prompt, Some(reply_schema()))).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[async_trait]
impl Summarizer for OllamaClient {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        self.post(&self.request(prompt, None)).await
    }
}

/// Ollama generate request body
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
}

/// Ollama generate response body
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OllamaClient {
        OllamaClient::new(&GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn test_generator_request_carries_schema() {
        let client = client();
        let body = serde_json::to_value(client.request("hello", Some(reply_schema()))).unwrap();
        assert_eq!(body["model"], "llama3.1:8b");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"]["required"][0], "wantsToSpeak");
    }

    #[test]
    fn test_summarizer_request_omits_format() {
        let client = client();
        let body = serde_json::to_value(client.request("sum", None)).unwrap();
        assert!(body.get("format").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"model":"m","response":"hi","done":true}"#).unwrap();
        assert_eq!(parsed.response, "hi");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let config = GeneratorConfig {
            // Port 9 (discard) is closed on test machines
            api_url: "http://127.0.0.1:9/api/generate".to_string(),
            timeout_secs: 2,
            ..GeneratorConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(Generator::name(&client), "ollama");
    }
}
