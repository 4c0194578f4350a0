//! Training status and background training trigger.

use super::{error_reply, ok_reply, JsonReply};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

/// `GET /api/training/status`: `{certified, score}` per assistant id.
pub(crate) async fn status(State(state): State<AppState>) -> JsonReply {
    ok_reply(&state.router.training_status().await)
}

/// `POST /api/training/train/:agent_id`: queue a run and return before it starts.
pub(crate) async fn train(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> JsonReply {
    if let Err(e) = state.router.schedule_training(&agent_id) {
        return error_reply(e);
    }
    (
        StatusCode::OK,
        Json(json!({
            "message": format!(
                "Training started for {} agent. Check the /api/training/status endpoint for progress.",
                agent_id
            )
        })),
    )
}
