use super::{trim_host, LanguageModel};
use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const PROVIDER: &str = "ollama";

/// Client for Ollama's non-streaming generate endpoint.
pub struct OllamaModel {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaModel {
    pub fn new(host: &str, api_key: Option<&str>, model: &str) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: format!("{}/api/generate", trim_host(host)),
            api_key: api_key.map(str::to_string),
            model: model.to_string(),
        }
    }
}

impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn complete(&self, prompt: &str) -> Result<String, DeckError> {
        let start = Instant::now();
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let mut builder = self.agent.post(&self.endpoint);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        let mut response = builder
            .send_json(&request)
            .map_err(|err| DeckError::transport(PROVIDER, err))?;
        let body: GenerateResponse = response
            .body_mut()
            .read_json()
            .map_err(|err| DeckError::transport(PROVIDER, format!("decode response: {err}")))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = prompt.len(),
            response_bytes = body.response.len(),
            model = %self.model,
            "lm invoke complete"
        );
        Ok(body.response)
    }
}
