use super::{trim_host, LanguageModel};
use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const PROVIDER: &str = "openai";

/// OpenAI-compatible chat completions client.
pub struct OpenAiModel {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiModel {
    pub fn new(host: &str, api_key: &str, model: &str) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: chat_endpoint(host),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

impl LanguageModel for OpenAiModel {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn complete(&self, prompt: &str) -> Result<String, DeckError> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send_json(&request)
            .map_err(|err| DeckError::transport(PROVIDER, err))?;
        let body: ChatResponse = response
            .body_mut()
            .read_json()
            .map_err(|err| DeckError::transport(PROVIDER, format!("decode response: {err}")))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DeckError::transport(PROVIDER, "response has no message content"))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = prompt.len(),
            response_bytes = content.len(),
            model = %self.model,
            "lm invoke complete"
        );
        Ok(content)
    }
}

fn chat_endpoint(host: &str) -> String {
    let host = trim_host(host);
    if host.ends_with("/v1") {
        format!("{host}/chat/completions")
    } else {
        format!("{host}/v1/chat/completions")
    }
}
