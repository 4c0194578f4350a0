use super::JsonReply;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

/// `GET /api/agents`: identity, provider and live certification per assistant.
pub(crate) async fn list(State(state): State<AppState>) -> JsonReply {
    let agents = state.router.roster().await;
    (StatusCode::OK, Json(json!({ "agents": agents })))
}
