//! One adapter per provider kind, sharing a single HTTP client.

use super::{
    AnthropicProvider, ChatCompletionsProvider, CohereProvider, GoogleProvider, LlmProvider,
    ProviderKeys, ProviderKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<ProviderKind, Arc<dyn LlmProvider>>,
}

impl ProviderSet {
    /// Build all six adapters. Providers without a key are still registered; their calls
    /// fail soft.
    pub fn from_keys(keys: &ProviderKeys, timeout: Duration) -> Self {
        let client = http_client(timeout);
        let key = |kind: ProviderKind| keys.get(kind).map(str::to_string);
        let mut set = Self::default();
        set.insert(Arc::new(ChatCompletionsProvider::openai(
            key(ProviderKind::OpenAi),
            client.clone(),
        )));
        set.insert(Arc::new(AnthropicProvider::new(
            key(ProviderKind::Anthropic),
            client.clone(),
        )));
        set.insert(Arc::new(ChatCompletionsProvider::groq(
            key(ProviderKind::Groq),
            client.clone(),
        )));
        set.insert(Arc::new(GoogleProvider::new(
            key(ProviderKind::Google),
            client.clone(),
        )));
        set.insert(Arc::new(CohereProvider::new(
            key(ProviderKind::Cohere),
            client.clone(),
        )));
        set.insert(Arc::new(ChatCompletionsProvider::emergenceai(
            key(ProviderKind::EmergenceAi),
            client,
        )));
        set
    }

    /// Register `provider` under its own kind, replacing any previous adapter.
    pub fn insert(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Shared client with a request timeout. Falls back to the default client if the builder fails.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_gets_an_adapter() {
        let set = ProviderSet::from_keys(&ProviderKeys::default(), Duration::from_secs(5));
        assert_eq!(set.len(), 6);
        for kind in ProviderKind::ALL {
            assert_eq!(set.get(kind).unwrap().kind(), kind);
        }
    }
}
