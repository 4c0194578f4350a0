use super::JsonReply;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ipmdar_core::check_connectivity;
use serde_json::json;

/// `GET /api/providers`: credential and reachability report for every provider.
pub(crate) async fn report(State(state): State<AppState>) -> JsonReply {
    let reports = check_connectivity(&state.keys, &state.http).await;
    let available: Vec<_> = state.keys.available();
    (
        StatusCode::OK,
        Json(json!({
            "providers": reports,
            "available": available,
            "fallback": state.keys.fallback(),
        })),
    )
}
