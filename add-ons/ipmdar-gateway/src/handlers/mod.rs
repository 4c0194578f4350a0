//! HTTP handlers. Every handler answers `(StatusCode, Json<Value>)`.

pub mod agents;
pub mod compete;
pub mod providers;
pub mod query;
pub mod training;

use axum::http::StatusCode;
use axum::Json;
use ipmdar_core::RouterError;
use serde_json::{json, Value};

pub(crate) type JsonReply = (StatusCode, Json<Value>);

pub(crate) fn error_reply(err: RouterError) -> JsonReply {
    let status = match &err {
        RouterError::EmptyQuery => StatusCode::BAD_REQUEST,
        RouterError::UnknownAgent(_) => StatusCode::NOT_FOUND,
        RouterError::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

pub(crate) fn ok_reply<T: serde::Serialize>(body: &T) -> JsonReply {
    match serde_json::to_value(body) {
        Ok(v) => (StatusCode::OK, Json(v)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
