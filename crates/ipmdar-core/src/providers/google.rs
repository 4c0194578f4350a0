//! Google Gemini `generateContent` adapter. The key travels in the `x-goog-api-key` header,
//! never in the URL, so transport errors cannot echo it.

use super::{
    first_text, send_json, LlmProvider, ProviderError, ProviderKind, ProviderResult, MAX_TOKENS,
    TEMPERATURE,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-pro";
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GoogleProvider {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            api_key,
            base_url: GOOGLE_API_BASE.to_string(),
            client,
        }
    }

    fn request(&self, key: &str, body: &GenerateRequest<'_>) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/models/{}:generateContent", self.base_url, MODEL))
            .header(API_KEY_HEADER, key)
            .json(body)
    }

    fn extract(response: GenerateResponse) -> ProviderResult<String> {
        first_text(
            response
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().next())
                .and_then(|p| p.text),
            "candidates[0].content.parts[0].text",
        )
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn complete(&self, _system: &str, prompt: &str) -> ProviderResult<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey(ProviderKind::Google))?;
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_TOKENS,
            },
        };
        let response: GenerateResponse = send_json(self.request(key, &body)).await?;
        Self::extract(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_generation_config() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "q" }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_TOKENS,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 1000);
        assert_eq!(v["contents"][0]["parts"][0]["text"], "q");
    }

    #[test]
    fn key_goes_in_a_header_not_the_url() {
        let provider = GoogleProvider::new(Some("SECRETKEY123".into()), reqwest::Client::new());
        let body = GenerateRequest {
            contents: Vec::new(),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_TOKENS,
            },
        };
        let request = provider.request("SECRETKEY123", &body).build().unwrap();
        assert!(request.url().query().is_none());
        assert!(!request.url().as_str().contains("SECRETKEY123"));
        assert_eq!(request.headers()[API_KEY_HEADER], "SECRETKEY123");
    }

    #[test]
    fn extracts_first_candidate_part() {
        let raw: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Risk is rising.\n" }] } }]
        }))
        .unwrap();
        assert_eq!(GoogleProvider::extract(raw).unwrap(), "Risk is rising.");
    }

    #[test]
    fn no_candidates_is_malformed() {
        let raw: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(GoogleProvider::extract(raw).is_err());
    }
}
