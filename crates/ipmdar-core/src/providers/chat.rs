//! OpenAI-compatible chat completions (OpenAI, Groq, EmergenceAI).

use super::{
    first_text, send_json, LlmProvider, ProviderError, ProviderKind, ProviderResult, MAX_TOKENS,
    TEMPERATURE,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const EMERGENCEAI_API_BASE: &str = "https://api.emergence.ai/v1";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Bearer-authenticated `POST {base}/chat/completions` adapter.
pub struct ChatCompletionsProvider {
    kind: ProviderKind,
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    /// OpenAI `gpt-4`.
    pub fn openai(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self::new(ProviderKind::OpenAi, api_key, "gpt-4", OPENAI_API_BASE, client)
    }

    /// Groq `llama2-70b-4096` through its OpenAI-compatible endpoint.
    pub fn groq(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self::new(ProviderKind::Groq, api_key, "llama2-70b-4096", GROQ_API_BASE, client)
    }

    /// EmergenceAI `emergence-7b`.
    pub fn emergenceai(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self::new(
            ProviderKind::EmergenceAi,
            api_key,
            "emergence-7b",
            EMERGENCEAI_API_BASE,
            client,
        )
    }

    fn new(
        kind: ProviderKind,
        api_key: Option<String>,
        model: &str,
        base_url: &str,
        client: reqwest::Client,
    ) -> Self {
        Self {
            kind,
            api_key,
            model: model.to_string(),
            base_url: base_url.to_string(),
            client,
        }
    }

    /// Point the adapter at another OpenAI-compatible host (proxies, local mocks).
    pub fn model(&self) -> &str {
        &self.model
    }

    fn extract(response: ChatResponse) -> ProviderResult<String> {
        first_text(
            response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
            "choices[0].message.content",
        )
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, system: &str, prompt: &str) -> ProviderResult<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey(self.kind))?;
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&body);
        let response: ChatResponse = send_json(request).await?;
        Self::extract(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_choice_trimmed() {
        let raw: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  EVM answer \n" } }]
        }))
        .unwrap();
        assert_eq!(ChatCompletionsProvider::extract(raw).unwrap(), "EVM answer");
    }

    #[test]
    fn empty_choices_is_malformed() {
        let raw: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            ChatCompletionsProvider::extract(raw),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn request_body_carries_shared_parameters() {
        let body = ChatRequest {
            model: "gpt-4",
            messages: vec![ChatMessage {
                role: "user",
                content: "q",
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "gpt-4");
        assert_eq!(v["max_tokens"], 1000);
        assert!((v["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider = ChatCompletionsProvider::groq(None, reqwest::Client::new());
        assert!(matches!(
            provider.complete("s", "p").await,
            Err(ProviderError::MissingKey(ProviderKind::Groq))
        ));
        assert_eq!(provider.model(), "llama2-70b-4096");
    }
}
