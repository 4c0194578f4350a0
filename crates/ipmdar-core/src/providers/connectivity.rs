//! Credential and reachability report for the six providers.

use super::google::API_KEY_HEADER;
use super::{ProviderKeys, ProviderKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Listed models successfully.
    Connected,
    /// Key present; the provider has no cheap listing endpoint so no request was made.
    Configured,
    MissingKey,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub provider: ProviderKind,
    pub status: ConnectionStatus,
    pub detail: String,
}

impl ConnectionReport {
    fn new(provider: ProviderKind, status: ConnectionStatus, detail: impl Into<String>) -> Self {
        Self {
            provider,
            status,
            detail: detail.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::Connected | ConnectionStatus::Configured
        )
    }
}

/// Check every provider in canonical order. Never fails; problems are reported per provider.
pub async fn check_connectivity(
    keys: &ProviderKeys,
    client: &reqwest::Client,
) -> Vec<ConnectionReport> {
    let mut reports = Vec::with_capacity(ProviderKind::ALL.len());
    for kind in ProviderKind::ALL {
        let report = match keys.get(kind) {
            None => ConnectionReport::new(kind, ConnectionStatus::MissingKey, "No API key found"),
            Some(key) => check_one(kind, key, client).await,
        };
        tracing::debug!(
            target: "ipmdar::providers",
            provider = %kind,
            status = ?report.status,
            "connectivity checked"
        );
        reports.push(report);
    }
    reports
}

/// Model-listing request for providers that have one. Credentials go in headers only.
fn listing_request(
    kind: ProviderKind,
    key: &str,
    client: &reqwest::Client,
) -> Option<reqwest::RequestBuilder> {
    match kind {
        ProviderKind::OpenAi => Some(
            client
                .get("https://api.openai.com/v1/models")
                .bearer_auth(key),
        ),
        ProviderKind::Groq => Some(
            client
                .get("https://api.groq.com/openai/v1/models")
                .bearer_auth(key),
        ),
        ProviderKind::Google => Some(
            client
                .get("https://generativelanguage.googleapis.com/v1beta/models")
                .header(API_KEY_HEADER, key),
        ),
        ProviderKind::Anthropic | ProviderKind::Cohere | ProviderKind::EmergenceAi => None,
    }
}

/// Failed report for a transport error. The URL is stripped from the message.
fn transport_failure(kind: ProviderKind, e: reqwest::Error) -> ConnectionReport {
    ConnectionReport::new(kind, ConnectionStatus::Failed, e.without_url().to_string())
}

async fn check_one(kind: ProviderKind, key: &str, client: &reqwest::Client) -> ConnectionReport {
    let Some(request) = listing_request(kind, key, client) else {
        let detail = match kind {
            ProviderKind::EmergenceAi => "API key found, but no test request made",
            _ => "Client configured with API key",
        };
        return ConnectionReport::new(kind, ConnectionStatus::Configured, detail);
    };

    match request.send().await {
        Ok(res) if res.status().is_success() => {
            ConnectionReport::new(kind, ConnectionStatus::Connected, "Connection successful")
        }
        Ok(res) => {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            ConnectionReport::new(
                kind,
                ConnectionStatus::Failed,
                format!("Connection failed (Status {}: {})", status, body),
            )
        }
        Err(e) => transport_failure(kind, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyless_and_unchecked_providers_need_no_network() {
        let keys = ProviderKeys::from_pairs([
            (ProviderKind::Anthropic, "a"),
            (ProviderKind::Cohere, "c"),
            (ProviderKind::EmergenceAi, "e"),
        ]);
        let client = reqwest::Client::new();
        let reports = check_connectivity(&keys, &client).await;
        let by_kind = |k: ProviderKind| reports.iter().find(|r| r.provider == k).unwrap();

        assert_eq!(reports.len(), 6);
        assert_eq!(by_kind(ProviderKind::OpenAi).status, ConnectionStatus::MissingKey);
        assert_eq!(by_kind(ProviderKind::Google).status, ConnectionStatus::MissingKey);
        assert!(by_kind(ProviderKind::Anthropic).is_ok());
        assert!(by_kind(ProviderKind::EmergenceAi).is_ok());
        assert!(!by_kind(ProviderKind::Groq).is_ok());
    }

    #[test]
    fn listing_requests_never_put_keys_in_the_url() {
        let client = reqwest::Client::new();
        for kind in [ProviderKind::OpenAi, ProviderKind::Groq, ProviderKind::Google] {
            let request = listing_request(kind, "SECRETKEY123", &client)
                .unwrap()
                .build()
                .unwrap();
            assert!(!request.url().as_str().contains("SECRETKEY123"), "{}", kind);
        }
        assert!(listing_request(ProviderKind::Cohere, "k", &client).is_none());
    }

    #[tokio::test]
    async fn transport_failure_detail_omits_the_url() {
        let client = reqwest::Client::new();
        let err = client
            .get("http://127.0.0.1:1/v1beta/models?key=SECRETKEY123")
            .send()
            .await
            .unwrap_err();
        let report = transport_failure(ProviderKind::Google, err);
        assert_eq!(report.status, ConnectionStatus::Failed);
        assert!(!report.detail.contains("SECRETKEY123"));
        assert!(!report.detail.contains("127.0.0.1"));
    }
}
