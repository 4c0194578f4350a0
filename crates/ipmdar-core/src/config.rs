//! Gateway configuration loaded from `config/ipmdar.toml` and the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process configuration. Built once at startup and shared by reference.
///
/// | Key | Default | Env override |
/// |-----|---------|--------------|
/// | app_name | IPMDAR Expert Gateway | IPMDAR__APP_NAME |
/// | host | 127.0.0.1 | IPMDAR__HOST |
/// | port | 8888 | IPMDAR__PORT |
/// | knowledge_path | data/ipmdar_guide.txt | IPMDAR__KNOWLEDGE_PATH |
/// | records_path | data/certification_records.json | IPMDAR__RECORDS_PATH |
/// | train_on_startup | true | IPMDAR__TRAIN_ON_STARTUP |
/// | simulate_delays | true | IPMDAR__SIMULATE_DELAYS |
/// | static_dir | unset | IPMDAR__STATIC_DIR |
/// | request_timeout_secs | 60 | IPMDAR__REQUEST_TIMEOUT_SECS |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// Plain-text export of the IPMDAR Implementation and Tailoring Guide.
    pub knowledge_path: String,
    /// JSON document holding every certification record.
    pub records_path: String,
    /// Train every uncertified assistant before the listener starts.
    #[serde(default = "default_true")]
    pub train_on_startup: bool,
    /// When false, curriculum delays are skipped (scores stay random).
    #[serde(default = "default_true")]
    pub simulate_delays: bool,
    /// Directory with the browser UI. Not served when unset.
    #[serde(default)]
    pub static_dir: Option<String>,
    /// Timeout applied to every provider request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "IPMDAR Expert Gateway".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8888,
            knowledge_path: "data/ipmdar_guide.txt".to_string(),
            records_path: "data/certification_records.json".to_string(),
            train_on_startup: true,
            simulate_delays: true,
            static_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment.
    /// Precedence: env `IPMDAR_CONFIG` path > `config/ipmdar.toml` > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("IPMDAR_CONFIG").unwrap_or_else(|_| "config/ipmdar.toml".to_string());
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("knowledge_path", defaults.knowledge_path)?
            .set_default("records_path", defaults.records_path)?
            .set_default("train_on_startup", defaults.train_on_startup)?
            .set_default("simulate_delays", defaults.simulate_delays)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("IPMDAR").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Trimmed, non-empty environment value.
pub(crate) fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let config = CoreConfig::default();
        assert_eq!(config.port, 8888);
        assert_eq!(config.bind_address(), "127.0.0.1:8888");
        assert!(config.train_on_startup);
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipmdar.toml");
        std::fs::write(
            &path,
            "port = 9100\nsimulate_delays = false\nstatic_dir = \"web\"\n",
        )
        .unwrap();
        let built = config::Config::builder()
            .set_default("app_name", "x")
            .unwrap()
            .set_default("host", "127.0.0.1")
            .unwrap()
            .set_default("port", 8888_i64)
            .unwrap()
            .set_default("knowledge_path", "k.txt")
            .unwrap()
            .set_default("records_path", "r.json")
            .unwrap()
            .add_source(config::File::from(path.as_path()))
            .build()
            .unwrap();
        let config: CoreConfig = built.try_deserialize().unwrap();
        assert_eq!(config.port, 9100);
        assert!(!config.simulate_delays);
        assert!(config.train_on_startup);
        assert_eq!(config.static_dir.as_deref(), Some("web"));
        assert_eq!(config.request_timeout_secs, 60);
    }
}
