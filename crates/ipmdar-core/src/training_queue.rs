//! Background training: requests enqueue a job and return at once; one worker task drains the
//! queue and runs jobs in order.

use crate::certification::TrainingCamp;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingJob {
    pub agent_id: String,
    pub agent_type: String,
}

#[derive(Debug, thiserror::Error)]
#[error("training worker has stopped")]
pub struct QueueClosed;

#[derive(Clone)]
pub struct TrainingQueue {
    tx: mpsc::UnboundedSender<TrainingJob>,
}

impl TrainingQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TrainingJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Never blocks.
    pub fn enqueue(&self, agent_id: &str, agent_type: &str) -> Result<(), QueueClosed> {
        self.tx
            .send(TrainingJob {
                agent_id: agent_id.to_string(),
                agent_type: agent_type.to_string(),
            })
            .map_err(|_| QueueClosed)
    }
}

/// Drain `rx` until every sender is dropped. Jobs are never forced, so an agent that is
/// already certified is skipped.
pub fn spawn_training_worker(
    camp: Arc<TrainingCamp>,
    mut rx: mpsc::UnboundedReceiver<TrainingJob>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            tracing::info!(target: "ipmdar::camp", agent = %job.agent_id, "training job started");
            let certified = camp.train(&job.agent_id, &job.agent_type, false).await;
            tracing::info!(
                target: "ipmdar::camp",
                agent = %job.agent_id,
                certified,
                "training job finished"
            );
        }
        tracing::debug!(target: "ipmdar::camp", "training queue closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certification::NoDelay;
    use crate::sampling::ScriptedSampler;

    #[tokio::test]
    async fn worker_trains_queued_agents_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let camp = Arc::new(TrainingCamp::open(
            dir.path().join("records.json"),
            Arc::new(ScriptedSampler::constant(0.9)),
            Arc::new(NoDelay),
        ));
        let (queue, rx) = TrainingQueue::new();
        let worker = spawn_training_worker(Arc::clone(&camp), rx);

        queue.enqueue("compliance", "compliance_policy").unwrap();
        queue.enqueue("data_analytics", "data_analytics").unwrap();
        drop(queue);
        worker.await.unwrap();

        assert!(camp.is_certified("compliance").await);
        assert!(camp.is_certified("data_analytics").await);
    }

    #[tokio::test]
    async fn enqueue_fails_once_worker_is_gone() {
        let (queue, rx) = TrainingQueue::new();
        drop(rx);
        assert!(queue.enqueue("compliance", "compliance_policy").is_err());
    }
}
