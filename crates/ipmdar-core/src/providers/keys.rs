//! Per-provider credentials and the preferred-or-fallback assignment rule.

use super::ProviderKind;
use crate::config::env_opt_string;
use std::collections::HashMap;

/// Credentials read from the environment. Blank values count as absent.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    keys: HashMap<ProviderKind, String>,
}

impl ProviderKeys {
    /// Read `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GROQ_API_KEY`, `GOOGLE_API_KEY`,
    /// `COHERE_API_KEY` and `EMERGENCEAI_API_KEY`.
    pub fn from_env() -> Self {
        let keys = ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| env_opt_string(kind.env_var()).map(|v| (kind, v)))
            .collect();
        Self { keys }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ProviderKind, S)>,
        S: Into<String>,
    {
        let keys = pairs
            .into_iter()
            .map(|(k, v)| (k, v.into().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Self { keys }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    pub fn has(&self, kind: ProviderKind) -> bool {
        self.keys.contains_key(&kind)
    }

    /// Keyed providers in canonical order.
    pub fn available(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|k| self.has(*k))
            .collect()
    }

    /// OpenAI when keyed, else the first keyed provider, else none.
    pub fn fallback(&self) -> Option<ProviderKind> {
        if self.has(ProviderKind::OpenAi) {
            Some(ProviderKind::OpenAi)
        } else {
            self.available().into_iter().next()
        }
    }

    /// Preferred provider when keyed, else the fallback, else OpenAI (whose calls will then
    /// fail soft with the apology).
    pub fn resolve(&self, preferred: ProviderKind) -> ProviderKind {
        if self.has(preferred) {
            return preferred;
        }
        match self.fallback() {
            Some(fallback) => {
                tracing::warn!(
                    target: "ipmdar::providers",
                    preferred = %preferred,
                    fallback = %fallback,
                    "provider not available; using fallback provider"
                );
                fallback
            }
            None => {
                tracing::warn!(
                    target: "ipmdar::providers",
                    preferred = %preferred,
                    "provider not available and no fallback provider set"
                );
                ProviderKind::OpenAi
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_is_the_preferred_fallback() {
        let keys = ProviderKeys::from_pairs([
            (ProviderKind::Cohere, "c"),
            (ProviderKind::OpenAi, "o"),
        ]);
        assert_eq!(keys.fallback(), Some(ProviderKind::OpenAi));
        assert_eq!(keys.resolve(ProviderKind::Google), ProviderKind::OpenAi);
        assert_eq!(keys.resolve(ProviderKind::Cohere), ProviderKind::Cohere);
    }

    #[test]
    fn first_available_in_canonical_order_without_openai() {
        let keys = ProviderKeys::from_pairs([
            (ProviderKind::EmergenceAi, "e"),
            (ProviderKind::Groq, "g"),
        ]);
        assert_eq!(keys.available(), vec![ProviderKind::Groq, ProviderKind::EmergenceAi]);
        assert_eq!(keys.fallback(), Some(ProviderKind::Groq));
        assert_eq!(keys.resolve(ProviderKind::Anthropic), ProviderKind::Groq);
    }

    #[test]
    fn no_keys_resolves_to_openai() {
        let keys = ProviderKeys::from_pairs([(ProviderKind::Google, "   ")]);
        assert!(keys.available().is_empty());
        assert_eq!(keys.fallback(), None);
        assert_eq!(keys.resolve(ProviderKind::Google), ProviderKind::OpenAi);
    }
}
