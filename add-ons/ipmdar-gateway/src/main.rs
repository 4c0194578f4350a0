//! ipmdar-gateway: HTTP front door for the IPMDAR expert assistants.
//!
//! Startup: load `.env` and config, bucket the guide text, assign providers, certify any
//! uncertified assistant, start the background training worker, then serve until Ctrl+C.
//!
//! `--check-apis` prints the provider connectivity report and exits.

mod handlers;

use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use ipmdar_core::{
    check_connectivity, http_client, spawn_training_worker, ArbitrationEngine, AssistantRegistry,
    CoreConfig, DelayHook, KnowledgeBase, NoDelay, ProviderKeys, ProviderSet, QueryRouter, Sampler,
    ThreadRngSampler, TokioDelay, TrainingCamp, TrainingQueue,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) router: Arc<QueryRouter>,
    /// Credentials as read at startup; used by the connectivity report.
    pub(crate) keys: Arc<ProviderKeys>,
    pub(crate) http: reqwest::Client,
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[ipmdar-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                target: "ipmdar::gateway",
                error = %e,
                "config not loaded; using defaults"
            );
            CoreConfig::default()
        }
    };
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let keys = ProviderKeys::from_env();
    let http = http_client(timeout);

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--check-apis") {
        let reports = check_connectivity(&keys, &http).await;
        for report in &reports {
            let mark = if report.is_ok() { "OK  " } else { "FAIL" };
            println!("[{}] {:<12} {}", mark, report.provider.label(), report.detail);
        }
        let code = if reports.iter().any(|r| r.is_ok()) { 0 } else { 1 };
        std::process::exit(code);
    }

    let available = keys.available();
    if available.is_empty() {
        tracing::warn!(
            target: "ipmdar::gateway",
            "no API providers available; agent responses will fail"
        );
    } else {
        tracing::info!(
            target: "ipmdar::gateway",
            providers = ?available,
            fallback = ?keys.fallback(),
            "API providers available"
        );
    }

    let knowledge = KnowledgeBase::load(&config.knowledge_path);
    tracing::info!(target: "ipmdar::gateway", buckets = ?knowledge.summary(), "knowledge buckets");

    let sampler: Arc<dyn Sampler> = Arc::new(ThreadRngSampler);
    let delay: Arc<dyn DelayHook> = if config.simulate_delays {
        Arc::new(TokioDelay)
    } else {
        Arc::new(NoDelay)
    };
    let registry = AssistantRegistry::build(
        Arc::new(knowledge),
        Arc::new(ProviderSet::from_keys(&keys, timeout)),
        &keys,
        Arc::clone(&sampler),
    );
    let camp = Arc::new(TrainingCamp::open(
        &config.records_path,
        Arc::clone(&sampler),
        delay,
    ));
    let (queue, jobs) = TrainingQueue::new();
    let _worker = spawn_training_worker(Arc::clone(&camp), jobs);
    let router = QueryRouter::new(registry, camp, ArbitrationEngine::new(sampler), queue);

    if config.train_on_startup {
        let certified = router.train_uncertified().await;
        tracing::info!(
            target: "ipmdar::gateway",
            certified,
            total = router.registry().len(),
            "startup certification complete"
        );
    }

    let addr = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
        router: Arc::new(router),
        keys: Arc::new(keys),
        http,
    };
    let app_name = state.config.app_name.clone();
    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(target: "ipmdar::gateway", addr = %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(target: "ipmdar::gateway", "{} listening on http://{}", app_name, addr);
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!(target: "ipmdar::gateway", "Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "ipmdar::gateway", "Shutdown requested (Ctrl+C received)");
        }
    }
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/query", post(handlers::query::query))
        .route("/api/compete", post(handlers::compete::compete))
        .route("/api/agents", get(handlers::agents::list))
        .route("/api/training/status", get(handlers::training::status))
        .route("/api/training/train/:agent_id", post(handlers::training::train))
        .route("/api/providers", get(handlers::providers::report))
        .with_state(state);

    if let Some(dir) = static_dir.filter(|d| Path::new(d).is_dir()) {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "app": state.config.app_name,
        "agents": state.router.registry().len(),
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}
