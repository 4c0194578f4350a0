//! ipmdar-core: IPMDAR expert assistants (knowledge buckets, provider adapters, certification
//! gate, arbitration engine, request router).
//!
//! The gateway add-on builds one [`QueryRouter`] at startup and shares it across handlers.

pub mod arbitration;
pub mod assistant;
pub mod certification;
mod config;
mod knowledge;
pub mod providers;
mod registry;
mod router;
mod sampling;
mod training_queue;

pub use arbitration::{
    ArbitrationEngine, CompetitionOutcome, CompetitionResult, Contender, ANALYSIS_FALLBACK,
};
pub use assistant::{Answer, Assistant, AssistantError, AssistantProfile, AssistantResult, PROFILES};
pub use certification::{
    CertificationRecord, DelayHook, NoDelay, RecordStore, TokioDelay, TrainingCamp, TrainingError,
};
pub use config::CoreConfig;
pub use knowledge::{Category, KnowledgeBase};
pub use providers::{
    check_connectivity, http_client, ConnectionReport, ConnectionStatus, LlmProvider, ProviderError,
    ProviderKeys, ProviderKind, ProviderSet,
};
pub use registry::{AssistantRegistry, ALL_AGENTS};
pub use router::{
    AgentInfo, AgentReply, Dispatch, QueryRouter, RouterError, RouterResult, TrainingStatus,
    UNCERTIFIED_RESPONSE,
};
pub use sampling::{Sampler, ScriptedSampler, ThreadRngSampler};
pub use training_queue::{spawn_training_worker, QueueClosed, TrainingJob, TrainingQueue};
