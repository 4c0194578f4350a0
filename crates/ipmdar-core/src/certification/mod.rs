//! Training camp: simulated curriculum runs and the certification gate in front of every
//! assistant.
//!
//! A run walks four stages (core, specialized, cross-domain, assessment). Each module score is a
//! uniform draw from the stage's range; certification is the mean of the five assessment scores
//! against [`curriculum::CERTIFICATION_THRESHOLD`]. Scores come from the injected [`Sampler`] and
//! pauses from the injected [`DelayHook`], so runs are deterministic under test.

pub mod curriculum;
pub mod store;

pub use store::{
    CertificationRecord, ModuleProgress, RecordStore, RecordStoreError, RecordStoreResult,
};

use crate::sampling::Sampler;
use async_trait::async_trait;
use curriculum::{StageSpec, ASSESSMENT_AREAS, ASSESSMENT_STAGE, CORE_MODULES, CORE_STAGE};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How a stage "spends" its simulated training time.
#[async_trait]
pub trait DelayHook: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real wall-clock pauses.
pub struct TokioDelay;

#[async_trait]
impl DelayHook for TokioDelay {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// No pauses at all.
pub struct NoDelay;

#[async_trait]
impl DelayHook for NoDelay {
    async fn pause(&self, _duration: Duration) {}
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("no training module for agent type '{0}'")]
    UnknownAgentType(String),
}

pub struct TrainingCamp {
    store: RecordStore,
    sampler: Arc<dyn Sampler>,
    delay: Arc<dyn DelayHook>,
}

impl TrainingCamp {
    /// Open (or start) the records file at `records_path`.
    pub fn open(
        records_path: impl AsRef<Path>,
        sampler: Arc<dyn Sampler>,
        delay: Arc<dyn DelayHook>,
    ) -> Self {
        Self {
            store: RecordStore::open(records_path),
            sampler,
            delay,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Run the full curriculum for `agent_id` and persist the outcome. Already-certified agents
    /// are left alone unless `force` is set. Returns whether the agent ends up certified.
    ///
    /// An unknown `agent_type` aborts after the core stage; the partial record is still saved.
    pub async fn train(&self, agent_id: &str, agent_type: &str, force: bool) -> bool {
        if !force && self.store.is_certified(agent_id).await {
            tracing::info!(
                target: "ipmdar::camp",
                agent = agent_id,
                "agent already certified, skipping training"
            );
            return true;
        }

        tracing::info!(target: "ipmdar::camp", agent = agent_id, agent_type, "beginning training");
        let mut record = CertificationRecord::start(agent_id, agent_type);
        self.store.upsert(record.clone()).await;

        let certified = match self.run_curriculum(&mut record).await {
            Ok(true) => {
                let now = store::now_timestamp();
                record.certified = true;
                record.certification_date = Some(now.clone());
                record.training_completed = Some(now);
                tracing::info!(
                    target: "ipmdar::camp",
                    agent = agent_id,
                    score = record.final_score.unwrap_or_default(),
                    "agent certified"
                );
                true
            }
            Ok(false) => {
                tracing::warn!(
                    target: "ipmdar::camp",
                    agent = agent_id,
                    score = record.final_score.unwrap_or_default(),
                    "agent failed certification"
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    target: "ipmdar::camp",
                    agent = agent_id,
                    error = %e,
                    "training aborted"
                );
                false
            }
        };

        self.store.upsert(record).await;
        self.persist().await;
        certified
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save().await {
            tracing::error!(
                target: "ipmdar::camp",
                error = %e,
                "error saving certification records"
            );
        }
    }

    async fn run_curriculum(
        &self,
        record: &mut CertificationRecord,
    ) -> Result<bool, TrainingError> {
        self.run_stage(record, CORE_STAGE, &CORE_MODULES).await;

        let agent_type = record.agent_type.clone();
        let specialized = curriculum::specialized_modules(&agent_type)
            .ok_or_else(|| TrainingError::UnknownAgentType(agent_type.clone()))?;
        self.run_stage(record, curriculum::SPECIALIZED_STAGE, specialized)
            .await;

        let cross = curriculum::cross_domain_modules(&agent_type).unwrap_or_default();
        self.run_stage(record, curriculum::CROSS_DOMAIN_STAGE, cross)
            .await;

        Ok(self.assess(record).await)
    }

    async fn run_stage(
        &self,
        record: &mut CertificationRecord,
        stage: StageSpec,
        modules: &[&str],
    ) {
        tracing::debug!(
            target: "ipmdar::camp",
            agent = %record.agent_id,
            stage = stage.label,
            modules = modules.len(),
            "training stage"
        );
        for module in modules {
            self.delay.pause(stage.delay).await;
            let score = self.sampler.uniform(stage.low, stage.high);
            record.record_module(module, score);
        }
        self.store.upsert(record.clone()).await;
    }

    async fn assess(&self, record: &mut CertificationRecord) -> bool {
        self.delay.pause(ASSESSMENT_STAGE.delay).await;
        let scores: Vec<f64> = ASSESSMENT_AREAS
            .iter()
            .map(|_| {
                self.sampler
                    .uniform(ASSESSMENT_STAGE.low, ASSESSMENT_STAGE.high)
            })
            .collect();
        for (area, score) in ASSESSMENT_AREAS.iter().zip(&scores) {
            record.assessment_scores.insert(area.to_string(), *score);
        }
        let (mean, certified) = curriculum::certification_outcome(&scores);
        record.final_score = Some(mean);
        certified
    }

    pub async fn is_certified(&self, agent_id: &str) -> bool {
        self.store.is_certified(agent_id).await
    }

    /// Final assessment score, or 0.0 for an agent that never finished an assessment.
    pub async fn score(&self, agent_id: &str) -> f64 {
        self.store
            .get(agent_id)
            .await
            .and_then(|r| r.final_score)
            .unwrap_or(0.0)
    }

    pub async fn details(&self, agent_id: &str) -> Option<CertificationRecord> {
        self.store.get(agent_id).await
    }

    /// Mark a refresher for an agent with a record, due at `due` (default: now).
    /// Returns the scheduled timestamp, or `None` for an agent the camp has never seen.
    pub async fn schedule_refresher(
        &self,
        agent_id: &str,
        due: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Option<String> {
        let due = due.unwrap_or_else(chrono::Utc::now).to_rfc3339();
        let scheduled = self
            .store
            .update(agent_id, |record| {
                record.refresher_training_scheduled = Some(due.clone())
            })
            .await;
        if !scheduled {
            tracing::warn!(
                target: "ipmdar::camp",
                agent = agent_id,
                "cannot schedule refresher training for unknown agent"
            );
            return None;
        }
        self.persist().await;
        tracing::info!(
            target: "ipmdar::camp",
            agent = agent_id,
            due = %due,
            "refresher training scheduled"
        );
        Some(due)
    }
}
