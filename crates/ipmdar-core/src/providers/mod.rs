//! Language-model provider adapters.
//!
//! Every adapter implements [`LlmProvider`]: a strict `complete` that reports what went wrong,
//! and the fail-soft `generate` the assistants call, which logs the failure and answers with
//! [`APOLOGY`] instead. Request shapes (endpoint, model, headers) are fixed per provider.

mod anthropic;
mod chat;
mod cohere;
mod connectivity;
mod google;
mod keys;
mod set;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use anthropic::AnthropicProvider;
pub use chat::ChatCompletionsProvider;
pub use cohere::CohereProvider;
pub use connectivity::{check_connectivity, ConnectionReport, ConnectionStatus};
pub use google::GoogleProvider;
pub use keys::ProviderKeys;
pub use set::{http_client, ProviderSet};

/// Returned to the caller whenever a provider call fails.
pub const APOLOGY: &str =
    "I apologize, but I encountered an error when generating a response. Please try again.";

/// Sampling temperature sent to every provider.
pub const TEMPERATURE: f32 = 0.2;
/// Completion token limit sent to every provider.
pub const MAX_TOKENS: u32 = 1000;

/// External language-model services, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Groq,
    Google,
    Cohere,
    EmergenceAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Groq,
        ProviderKind::Google,
        ProviderKind::Cohere,
        ProviderKind::EmergenceAi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Groq => "groq",
            ProviderKind::Google => "google",
            ProviderKind::Cohere => "cohere",
            ProviderKind::EmergenceAi => "emergenceai",
        }
    }

    /// Environment variable holding this provider's credential.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Google => "GOOGLE_API_KEY",
            ProviderKind::Cohere => "COHERE_API_KEY",
            ProviderKind::EmergenceAi => "EMERGENCEAI_API_KEY",
        }
    }

    /// Human-facing service name for reports.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Groq => "Groq",
            ProviderKind::Google => "Google Gemini",
            ProviderKind::Cohere => "Cohere",
            ProviderKind::EmergenceAi => "EmergenceAI",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ProviderError::UnknownProvider(s.to_string()))
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} API key not configured")]
    MissingKey(ProviderKind),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Uniform `generate(prompt) -> text` contract over one external service.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// One request, no retries. `system` is the persona line; adapters without a system
    /// slot send `prompt` alone.
    async fn complete(&self, system: &str, prompt: &str) -> ProviderResult<String>;

    /// Fail-soft completion: any error is logged and replaced by [`APOLOGY`].
    async fn generate(&self, system: &str, prompt: &str) -> String {
        match self.complete(system, prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    target: "ipmdar::providers",
                    provider = %self.kind(),
                    error = %e,
                    "error generating response"
                );
                APOLOGY.to_string()
            }
        }
    }
}

/// Send a prepared request and decode a JSON body. Non-2xx statuses become
/// [`ProviderError::Status`]; transport errors lose their URL before they reach a log line.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> ProviderResult<T> {
    let res = request.send().await.map_err(reqwest::Error::without_url)?;
    let status = res.status();
    let text = res.text().await.map_err(reqwest::Error::without_url)?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// Trimmed first text, or `Malformed` naming the missing path.
pub(crate) fn first_text(text: Option<String>, path: &str) -> ProviderResult<String> {
    text.map(|t| t.trim().to_string())
        .ok_or_else(|| ProviderError::Malformed(format!("missing {}", path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl LlmProvider for Failing {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Cohere
        }

        async fn complete(&self, _system: &str, _prompt: &str) -> ProviderResult<String> {
            Err(ProviderError::Malformed("boom".into()))
        }
    }

    #[tokio::test]
    async fn generate_replaces_errors_with_apology() {
        assert_eq!(Failing.generate("sys", "prompt").await, APOLOGY);
    }

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!(" EmergenceAI ".parse::<ProviderKind>().unwrap(), ProviderKind::EmergenceAi);
        assert!("mistral".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ProviderKind::EmergenceAi).unwrap(), "emergenceai");
        assert_eq!(serde_json::to_value(ProviderKind::OpenAi).unwrap(), "openai");
    }
}
