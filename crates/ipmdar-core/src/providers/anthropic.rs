//! Anthropic Messages API adapter.

use super::{
    first_text, send_json, LlmProvider, ProviderError, ProviderKind, ProviderResult, MAX_TOKENS,
    TEMPERATURE,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-2";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicProvider {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            api_key,
            base_url: ANTHROPIC_API_BASE.to_string(),
            client,
        }
    }

    fn extract(response: MessagesResponse) -> ProviderResult<String> {
        first_text(
            response.content.into_iter().next().and_then(|b| b.text),
            "content[0].text",
        )
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, system: &str, prompt: &str) -> ProviderResult<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey(ProviderKind::Anthropic))?;
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response: MessagesResponse = send_json(request).await?;
        Self::extract(response)
    }
}
