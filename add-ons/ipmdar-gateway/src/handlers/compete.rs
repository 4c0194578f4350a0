//! `POST /api/compete`: fastest certified assistant wins, peers review, corrections race.

use super::{error_reply, ok_reply, JsonReply};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ipmdar_core::CompetitionOutcome;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CompeteRequest {
    #[serde(default)]
    pub query: String,
}

pub(crate) async fn compete(
    State(state): State<AppState>,
    Json(body): Json<CompeteRequest>,
) -> JsonReply {
    match state.router.compete(&body.query).await {
        Ok(CompetitionOutcome::Decided(result)) => ok_reply(&result),
        // Reported in the body; the request itself succeeded.
        Ok(CompetitionOutcome::NoCandidates) => (
            StatusCode::OK,
            Json(json!({ "error": "No certified agents available to compete" })),
        ),
        Err(e) => error_reply(e),
    }
}
