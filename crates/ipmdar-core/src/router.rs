//! Request routing: one assistant or all of them, behind the certification gate.
//!
//! Provider failures never escape as errors here. A failed answer becomes a reply carrying the
//! apology text and an `error` field; an uncertified assistant gets its own normal-path reply.

use crate::arbitration::{ArbitrationEngine, CompetitionOutcome, Contender};
use crate::assistant::Assistant;
use crate::certification::TrainingCamp;
use crate::providers::{ProviderKind, APOLOGY};
use crate::registry::{AssistantRegistry, ALL_AGENTS};
use crate::training_queue::{QueueClosed, TrainingQueue};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const UNCERTIFIED_RESPONSE: &str =
    "This agent has not completed certification and cannot provide expert answers.";

pub type RouterResult<T> = Result<T, RouterError>;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("No query provided")]
    EmptyQuery,

    #[error("Agent '{0}' not found")]
    UnknownAgent(String),

    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// One assistant's contribution to a `/api/query` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub response: String,
    pub accuracy: String,
    pub certified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dispatch {
    Single(AgentReply),
    All { responses: Vec<AgentReply> },
}

/// Identity plus live status, as listed by `/api/agents`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub expertise: &'static str,
    pub provider: ProviderKind,
    pub certified: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingStatus {
    pub certified: bool,
    pub score: f64,
}

pub struct QueryRouter {
    registry: AssistantRegistry,
    camp: Arc<TrainingCamp>,
    engine: ArbitrationEngine,
    queue: TrainingQueue,
}

impl QueryRouter {
    pub fn new(
        registry: AssistantRegistry,
        camp: Arc<TrainingCamp>,
        engine: ArbitrationEngine,
        queue: TrainingQueue,
    ) -> Self {
        Self {
            registry,
            camp,
            engine,
            queue,
        }
    }

    pub fn registry(&self) -> &AssistantRegistry {
        &self.registry
    }

    pub fn camp(&self) -> &Arc<TrainingCamp> {
        &self.camp
    }

    /// Route `query` to `target`: an assistant id or [`ALL_AGENTS`].
    pub async fn dispatch(&self, query: &str, target: &str) -> RouterResult<Dispatch> {
        if query.is_empty() {
            return Err(RouterError::EmptyQuery);
        }
        if target == ALL_AGENTS {
            let mut responses = Vec::with_capacity(self.registry.len());
            for assistant in self.registry.iter() {
                responses.push(self.reply(assistant, query, true).await);
            }
            return Ok(Dispatch::All { responses });
        }
        let assistant = self
            .registry
            .get(target)
            .ok_or_else(|| RouterError::UnknownAgent(target.to_string()))?;
        Ok(Dispatch::Single(self.reply(assistant, query, false).await))
    }

    /// Replies inside an "all" fan-out are labelled by assistant id; a single certified reply
    /// carries the persona's display name instead.
    async fn reply(&self, assistant: &Assistant, query: &str, in_fanout: bool) -> AgentReply {
        let id_label = Some(assistant.id().to_string());
        if !self.camp.is_certified(assistant.id()).await {
            return AgentReply {
                agent: if in_fanout { id_label } else { None },
                response: UNCERTIFIED_RESPONSE.to_string(),
                accuracy: "0%".to_string(),
                certified: false,
                provider: None,
                error: None,
            };
        }

        let provider = Some(assistant.provider());
        match assistant.answer(query).await {
            Ok(answer) => AgentReply {
                agent: if in_fanout { id_label } else { Some(answer.agent) },
                response: answer.response,
                accuracy: answer.accuracy,
                certified: true,
                provider,
                error: None,
            },
            Err(e) => {
                tracing::error!(
                    target: "ipmdar::router",
                    assistant = assistant.id(),
                    error = %e,
                    "assistant failed to answer"
                );
                AgentReply {
                    agent: id_label,
                    response: APOLOGY.to_string(),
                    accuracy: "0%".to_string(),
                    certified: true,
                    provider,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Run a competition among the currently certified assistants.
    pub async fn compete(&self, query: &str) -> RouterResult<CompetitionOutcome> {
        if query.is_empty() {
            return Err(RouterError::EmptyQuery);
        }
        let mut contenders: Vec<Arc<dyn Contender>> = Vec::new();
        for assistant in self.registry.iter() {
            if self.camp.is_certified(assistant.id()).await {
                contenders.push(Arc::clone(assistant) as Arc<dyn Contender>);
            }
        }
        tracing::info!(
            target: "ipmdar::router",
            contenders = contenders.len(),
            "competition started"
        );
        Ok(self.engine.compete(query, &contenders).await)
    }

    pub async fn roster(&self) -> Vec<AgentInfo> {
        let mut agents = Vec::with_capacity(self.registry.len());
        for assistant in self.registry.iter() {
            let profile = assistant.profile();
            agents.push(AgentInfo {
                id: profile.id,
                name: profile.name,
                expertise: profile.expertise,
                provider: assistant.provider(),
                certified: self.camp.is_certified(profile.id).await,
                description: profile.description,
            });
        }
        agents
    }

    pub async fn training_status(&self) -> BTreeMap<&'static str, TrainingStatus> {
        let mut status = BTreeMap::new();
        for id in self.registry.ids() {
            status.insert(
                id,
                TrainingStatus {
                    certified: self.camp.is_certified(id).await,
                    score: self.camp.score(id).await,
                },
            );
        }
        status
    }

    /// Queue a background training run and return immediately.
    pub fn schedule_training(&self, agent_id: &str) -> RouterResult<()> {
        let assistant = self
            .registry
            .get(agent_id)
            .ok_or_else(|| RouterError::UnknownAgent(agent_id.to_string()))?;
        self.queue
            .enqueue(assistant.id(), assistant.profile().agent_type)?;
        tracing::info!(target: "ipmdar::router", agent = agent_id, "training queued");
        Ok(())
    }

    /// Train every assistant that is not yet certified, one after another. Returns how many
    /// ended up certified.
    pub async fn train_uncertified(&self) -> usize {
        let mut certified = 0;
        for assistant in self.registry.iter() {
            let id = assistant.id();
            if self.camp.is_certified(id).await
                || self
                    .camp
                    .train(id, assistant.profile().agent_type, false)
                    .await
            {
                certified += 1;
            }
        }
        certified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certification::NoDelay;
    use crate::knowledge::KnowledgeBase;
    use crate::providers::{LlmProvider, ProviderKeys, ProviderResult, ProviderSet};
    use crate::sampling::ScriptedSampler;
    use crate::training_queue::TrainingJob;
    use async_trait::async_trait;

    struct Echo(ProviderKind);

    #[async_trait]
    impl LlmProvider for Echo {
        fn kind(&self) -> ProviderKind {
            self.0
        }

        async fn complete(&self, _system: &str, _prompt: &str) -> ProviderResult<String> {
            Ok(format!("answer from {}", self.0))
        }
    }

    type Jobs = tokio::sync::mpsc::UnboundedReceiver<TrainingJob>;

    /// All six providers registered; returns the router and its training worker receiver.
    fn router(dir: &tempfile::TempDir) -> (QueryRouter, Jobs) {
        router_without(dir, None)
    }

    /// Every key is configured, but `missing` has no provider behind it, so assistants
    /// assigned to it fail to answer.
    fn router_without(
        dir: &tempfile::TempDir,
        missing: Option<ProviderKind>,
    ) -> (QueryRouter, Jobs) {
        let keys = ProviderKeys::from_pairs(ProviderKind::ALL.map(|k| (k, "key")));
        let mut providers = ProviderSet::default();
        for kind in ProviderKind::ALL.into_iter().filter(|k| Some(*k) != missing) {
            providers.insert(Arc::new(Echo(kind)));
        }
        let sampler = Arc::new(ScriptedSampler::constant(0.9));
        let registry = AssistantRegistry::build(
            Arc::new(KnowledgeBase::default()),
            Arc::new(providers),
            &keys,
            sampler.clone(),
        );
        let camp = Arc::new(TrainingCamp::open(
            dir.path().join("records.json"),
            sampler.clone(),
            Arc::new(NoDelay),
        ));
        let (queue, rx) = TrainingQueue::new();
        (
            QueryRouter::new(registry, camp, ArbitrationEngine::new(sampler), queue),
            rx,
        )
    }

    #[tokio::test]
    async fn empty_query_and_unknown_agent_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _rx) = router(&dir);
        assert!(matches!(
            router.dispatch("", "compliance").await,
            Err(RouterError::EmptyQuery)
        ));
        assert!(matches!(router.compete("").await, Err(RouterError::EmptyQuery)));
        assert!(router.dispatch("  ", "compliance").await.is_ok());
        let err = router.dispatch("q", "nobody").await.unwrap_err();
        assert_eq!(err.to_string(), "Agent 'nobody' not found");
    }

    #[tokio::test]
    async fn uncertified_single_reply_has_no_provider() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _rx) = router(&dir);
        let Dispatch::Single(reply) = router.dispatch("q", "compliance").await.unwrap() else {
            panic!("expected a single reply");
        };
        assert!(!reply.certified);
        assert_eq!(reply.accuracy, "0%");
        assert_eq!(reply.response, UNCERTIFIED_RESPONSE);
        assert!(reply.agent.is_none() && reply.provider.is_none());
    }

    #[tokio::test]
    async fn all_returns_one_reply_per_assistant() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _rx) = router(&dir);
        router
            .camp()
            .train("compliance", "compliance_policy", false)
            .await;

        let Dispatch::All { responses } = router.dispatch("q", ALL_AGENTS).await.unwrap() else {
            panic!("expected a fan-out");
        };
        let ids: Vec<_> = responses.iter().filter_map(|r| r.agent.clone()).collect();
        assert_eq!(ids, router.registry().ids());
        assert!(responses[0].certified);
        assert_eq!(responses[0].response, "answer from openai");
        assert_eq!(responses[0].provider, Some(ProviderKind::OpenAi));
        assert!(responses[1..].iter().all(|r| !r.certified));
    }

    #[tokio::test]
    async fn certified_single_reply_uses_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _rx) = router(&dir);
        router.train_uncertified().await;
        let Dispatch::Single(reply) = router.dispatch("q", "risk_forecasting").await.unwrap() else {
            panic!("expected a single reply");
        };
        assert_eq!(reply.agent.as_deref(), Some("Dr. Risk & Forecasting"));
        assert_eq!(reply.provider, Some(ProviderKind::Google));
        assert_eq!(reply.accuracy, "95%");
    }

    #[tokio::test]
    async fn provider_failure_becomes_an_apology_reply() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _rx) = router_without(&dir, Some(ProviderKind::Google));
        router.train_uncertified().await;

        let Dispatch::Single(reply) = router.dispatch("q", "risk_forecasting").await.unwrap() else {
            panic!("expected a single reply");
        };
        assert_eq!(reply.agent.as_deref(), Some("risk_forecasting"));
        assert_eq!(reply.response, APOLOGY);
        assert_eq!(reply.accuracy, "0%");
        assert!(reply.certified);
        assert_eq!(reply.provider, Some(ProviderKind::Google));
        assert!(reply.error.is_some());

        let Dispatch::All { responses } = router.dispatch("q", ALL_AGENTS).await.unwrap() else {
            panic!("expected a fan-out");
        };
        assert_eq!(responses.len(), 6);
        let failed: Vec<_> = responses.iter().filter(|r| r.error.is_some()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].agent.as_deref(), Some("risk_forecasting"));
        assert_eq!(failed[0].accuracy, "0%");
        assert!(failed[0].certified);
        assert!(responses.iter().all(|r| r.certified));
    }

    #[tokio::test]
    async fn compete_without_certified_assistants_has_no_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _rx) = router(&dir);
        assert_eq!(
            router.compete("q").await.unwrap(),
            CompetitionOutcome::NoCandidates
        );
    }

    #[tokio::test]
    async fn schedule_training_validates_and_enqueues() {
        let dir = tempfile::tempdir().unwrap();
        let (router, mut rx) = router(&dir);
        assert!(matches!(
            router.schedule_training("all"),
            Err(RouterError::UnknownAgent(_))
        ));
        router.schedule_training("systems_integration").unwrap();
        let job = rx.recv().await.unwrap();
        assert_eq!(job.agent_type, "systems_integration");
    }

    #[tokio::test]
    async fn status_and_roster_reflect_training() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _rx) = router(&dir);
        assert_eq!(router.train_uncertified().await, 6);
        let status = router.training_status().await;
        assert_eq!(status.len(), 6);
        assert!(status.values().all(|s| s.certified && s.score > 0.85));
        assert!(router.roster().await.iter().all(|a| a.certified));
    }
}
