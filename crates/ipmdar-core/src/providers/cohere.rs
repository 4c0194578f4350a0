//! Cohere `generate` adapter (single prompt, no system slot).

use super::{
    first_text, send_json, LlmProvider, ProviderError, ProviderKind, ProviderResult, MAX_TOKENS,
    TEMPERATURE,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const COHERE_API_BASE: &str = "https://api.cohere.ai/v1";
const MODEL: &str = "command-light";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    k: u32,
    stop_sequences: Vec<String>,
    return_likelihoods: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Deserialize)]
struct Generation {
    #[serde(default)]
    text: Option<String>,
}

pub struct CohereProvider {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl CohereProvider {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            api_key,
            base_url: COHERE_API_BASE.to_string(),
            client,
        }
    }

    fn extract(response: GenerateResponse) -> ProviderResult<String> {
        first_text(
            response.generations.into_iter().next().and_then(|g| g.text),
            "generations[0].text",
        )
    }
}

#[async_trait]
impl LlmProvider for CohereProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cohere
    }

    async fn complete(&self, _system: &str, prompt: &str) -> ProviderResult<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey(ProviderKind::Cohere))?;
        let body = GenerateRequest {
            model: MODEL,
            prompt,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            k: 0,
            stop_sequences: Vec::new(),
            return_likelihoods: "NONE",
        };
        let request = self
            .client
            .post(format!("{}/generate", self.base_url))
            .bearer_auth(key)
            .json(&body);
        let response: GenerateResponse = send_json(request).await?;
        Self::extract(response)
    }
}
