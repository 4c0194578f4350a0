//! `POST /api/query`: ask one assistant, or all of them with `"agent": "all"`.

use super::{error_reply, ok_reply, JsonReply};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use ipmdar_core::ALL_AGENTS;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_agent")]
    pub agent: String,
}

fn default_agent() -> String {
    ALL_AGENTS.to_string()
}

pub(crate) async fn query(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> JsonReply {
    tracing::info!(target: "ipmdar::gateway", agent = %body.agent, "query received");
    match state.router.dispatch(&body.query, &body.agent).await {
        Ok(dispatch) => ok_reply(&dispatch),
        Err(e) => error_reply(e),
    }
}
