//! Certification records and their JSON file.
//!
//! The whole map is rewritten on every save, staged in a sibling `.tmp` file and renamed into
//! place. The async mutex makes the store single-writer: a background training run and request
//! handlers never interleave a read-modify-write.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub completed: bool,
    pub completion_date: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRecord {
    pub agent_id: String,
    pub agent_type: String,
    pub training_started: String,
    pub training_completed: Option<String>,
    #[serde(default)]
    pub curriculum_progress: BTreeMap<String, ModuleProgress>,
    #[serde(default)]
    pub assessment_scores: BTreeMap<String, f64>,
    pub certified: bool,
    pub certification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresher_training_scheduled: Option<String>,
}

impl CertificationRecord {
    /// Fresh, uncertified record stamped with the current time.
    pub fn start(agent_id: &str, agent_type: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            agent_type: agent_type.to_string(),
            training_started: now_timestamp(),
            training_completed: None,
            curriculum_progress: BTreeMap::new(),
            assessment_scores: BTreeMap::new(),
            certified: false,
            certification_date: None,
            final_score: None,
            refresher_training_scheduled: None,
        }
    }

    pub fn record_module(&mut self, module: &str, score: f64) {
        self.curriculum_progress.insert(
            module.to_string(),
            ModuleProgress {
                completed: true,
                completion_date: now_timestamp(),
                score,
            },
        );
    }
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("certification records I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("certification records JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct RecordStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, CertificationRecord>>,
}

impl RecordStore {
    /// Load records from `path`. A missing file starts empty; an unreadable one is logged and
    /// also starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match Self::read(&path) {
            Ok(Some(records)) => {
                tracing::info!(
                    target: "ipmdar::camp",
                    agents = records.len(),
                    "loaded existing certification records"
                );
                records
            }
            Ok(None) => {
                tracing::info!(target: "ipmdar::camp", "no existing certification records found");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::error!(
                    target: "ipmdar::camp",
                    error = %e,
                    "error loading certification records"
                );
                BTreeMap::new()
            }
        };
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    fn read(path: &Path) -> RecordStoreResult<Option<BTreeMap<String, CertificationRecord>>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, agent_id: &str) -> Option<CertificationRecord> {
        self.records.lock().await.get(agent_id).cloned()
    }

    pub async fn is_certified(&self, agent_id: &str) -> bool {
        self.records
            .lock()
            .await
            .get(agent_id)
            .map(|r| r.certified)
            .unwrap_or(false)
    }

    /// Insert or replace a record in memory. Call [`RecordStore::save`] to persist.
    pub async fn upsert(&self, record: CertificationRecord) {
        self.records
            .lock()
            .await
            .insert(record.agent_id.clone(), record);
    }

    /// Apply `f` to an existing record. Returns false when the agent has no record.
    pub async fn update<F>(&self, agent_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut CertificationRecord),
    {
        match self.records.lock().await.get_mut(agent_id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    pub async fn snapshot(&self) -> BTreeMap<String, CertificationRecord> {
        self.records.lock().await.clone()
    }

    /// Sibling file the next save is staged in before it replaces [`RecordStore::path`].
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Rewrite the whole file (pretty JSON). The document is written to a sibling temp file and
    /// renamed over the old one, so a crash mid-write leaves the previous records intact. The
    /// lock is held until the rename completes.
    pub async fn save(&self) -> RecordStoreResult<()> {
        let records = self.records.lock().await;
        let json = serde_json::to_string_pretty(&*records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        tracing::info!(
            target: "ipmdar::camp",
            agents = records.len(),
            "saved certification records"
        );
        Ok(())
    }
}
