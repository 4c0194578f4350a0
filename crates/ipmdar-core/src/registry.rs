//! Ordered set of assistants, built once at startup and shared by `Arc`.

use crate::assistant::{Assistant, PROFILES};
use crate::knowledge::KnowledgeBase;
use crate::providers::{ProviderKeys, ProviderSet};
use crate::sampling::Sampler;
use std::sync::Arc;

/// Target id that addresses every assistant at once. Never an assistant id itself.
pub const ALL_AGENTS: &str = "all";

pub struct AssistantRegistry {
    assistants: Vec<Arc<Assistant>>,
}

impl AssistantRegistry {
    /// One assistant per profile, each assigned its preferred provider or the fallback
    /// resolved from `keys`.
    pub fn build(
        knowledge: Arc<KnowledgeBase>,
        providers: Arc<ProviderSet>,
        keys: &ProviderKeys,
        sampler: Arc<dyn Sampler>,
    ) -> Self {
        let assistants = PROFILES
            .iter()
            .map(|profile| {
                let provider = keys.resolve(profile.preferred_provider);
                tracing::info!(
                    target: "ipmdar::registry",
                    assistant = profile.name,
                    provider = %provider,
                    "provider assigned"
                );
                Arc::new(Assistant::new(
                    profile,
                    provider,
                    Arc::clone(&knowledge),
                    Arc::clone(&providers),
                    Arc::clone(&sampler),
                ))
            })
            .collect();
        Self { assistants }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Assistant>> {
        self.assistants.iter().find(|a| a.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Assistants in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Assistant>> {
        self.assistants.iter()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.assistants.iter().map(|a| a.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.assistants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assistants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;
    use crate::sampling::ThreadRngSampler;
    use std::time::Duration;

    #[test]
    fn build_assigns_fallback_for_missing_keys() {
        let keys =
            ProviderKeys::from_pairs([(ProviderKind::Groq, "g"), (ProviderKind::Google, "k")]);
        let registry = AssistantRegistry::build(
            Arc::new(KnowledgeBase::default()),
            Arc::new(ProviderSet::from_keys(&keys, Duration::from_secs(1))),
            &keys,
            Arc::new(ThreadRngSampler),
        );
        assert_eq!(
            registry.ids(),
            vec![
                "compliance",
                "data_analytics",
                "project_management",
                "risk_forecasting",
                "systems_integration",
                "implementation_support",
            ]
        );
        assert_eq!(registry.get("project_management").unwrap().provider(), ProviderKind::Groq);
        assert_eq!(registry.get("risk_forecasting").unwrap().provider(), ProviderKind::Google);
        assert_eq!(registry.get("compliance").unwrap().provider(), ProviderKind::Groq);
        assert!(!registry.contains(ALL_AGENTS));
    }
}
